//! # Sidecar Flows
//!
//! The command bridge dispatching through the sidecar host. The worker is a
//! task on the far side of in-memory pipes: it reads newline-delimited
//! frames from its stdin and writes newline-delimited responses to its
//! stdout, exactly what a real worker process sees.

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use engine_bridge::{BridgeConfig, BridgeError, CommandBridge, TransportError};
    use engine_bus::OutputEventBus;
    use engine_host::Sidecar;
    use serde_json::{json, Value};
    use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
    use tokio::task::JoinHandle;

    const EVENT: &str = "python-response";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Rig {
        bridge: Arc<CommandBridge>,
        sidecar: Arc<Sidecar>,
    }

    fn rig(data_dir: PathBuf) -> (Rig, DuplexStream, DuplexStream) {
        let (host_stdin, worker_stdin) = duplex(64 * 1024);
        let (worker_stdout, host_stdout) = duplex(64 * 1024);

        let bus = Arc::new(OutputEventBus::new());
        let sidecar = Arc::new(Sidecar::attach(
            host_stdin,
            host_stdout,
            bus.clone(),
            EVENT.to_string(),
            data_dir,
        ));
        let bridge =
            CommandBridge::new(BridgeConfig::default(), bus, sidecar.clone()).unwrap();

        let rig = Rig {
            bridge: Arc::new(bridge),
            sidecar,
        };
        (rig, worker_stdin, worker_stdout)
    }

    /// Worker that answers every frame with its `cmd` and `params`, after a
    /// line of log noise.
    fn echo_worker(stdin: DuplexStream, mut stdout: DuplexStream) -> JoinHandle<Vec<Value>> {
        tokio::spawn(async move {
            let mut frames = Vec::new();
            let mut lines = BufReader::new(stdin).lines();

            while let Ok(Some(line)) = lines.next_line().await {
                let frame: Value = serde_json::from_str(&line).unwrap();
                let reply = json!({
                    "status": "ok",
                    "data": {"cmd": frame["cmd"], "params": frame["params"]},
                    "request_id": frame["request_id"],
                });
                let out = format!("[engine] handling {}\n{}\n", frame["cmd"], reply);
                if stdout.write_all(out.as_bytes()).await.is_err() {
                    break;
                }
                frames.push(frame);
            }
            frames
        })
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_load_data_round_trip_resolves_history_file() {
        let data = tempfile::tempdir().unwrap();
        let history = data.path().join("history");
        std::fs::create_dir_all(&history).unwrap();
        std::fs::write(history.join("2024.feather"), b"").unwrap();

        let (rig, worker_stdin, worker_stdout) = rig(data.path().to_path_buf());
        let worker = echo_worker(worker_stdin, worker_stdout);

        let response = rig
            .bridge
            .invoke("load_data", json!({"file_path": "2024"}))
            .await
            .unwrap();

        let data_field = response.data().unwrap();
        assert_eq!(data_field["cmd"], "load_data");
        assert_eq!(
            data_field["params"]["file_path"],
            json!(history.join("2024.feather").to_string_lossy())
        );

        rig.sidecar.shutdown().await.unwrap();
        let frames = worker.await.unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0]["request_id"].as_str(),
            response.request_id().map(|id| id.as_str())
        );
    }

    #[tokio::test]
    async fn test_concurrent_commands_over_one_pipe() {
        let (rig, worker_stdin, worker_stdout) = rig(PathBuf::from("/nonexistent/data"));
        let worker = echo_worker(worker_stdin, worker_stdout);

        let backtest = {
            let bridge = rig.bridge.clone();
            tokio::spawn(async move { bridge.invoke("run_backtest", json!({"rounds": 10})).await })
        };
        let replay = {
            let bridge = rig.bridge.clone();
            tokio::spawn(async move {
                bridge
                    .invoke("get_replay_state", json!({"period": "2024-100"}))
                    .await
            })
        };
        let stats = rig.bridge.invoke("get_data_stats", Value::Null).await.unwrap();

        let backtest = backtest.await.unwrap().unwrap();
        let replay = replay.await.unwrap().unwrap();

        assert_eq!(backtest.data().unwrap()["cmd"], "run_backtest");
        assert_eq!(backtest.data().unwrap()["params"]["rounds"], 10);
        assert_eq!(replay.data().unwrap()["params"]["period"], "2024-100");
        assert_eq!(stats.data().unwrap()["cmd"], "get_data_stats");
        assert!(stats.data().unwrap()["params"].is_null());

        rig.sidecar.shutdown().await.unwrap();
        assert_eq!(worker.await.unwrap().len(), 3);
        assert_eq!(rig.bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_exited_worker_fails_fast() {
        let (rig, worker_stdin, worker_stdout) = rig(PathBuf::from("/nonexistent/data"));
        drop(worker_stdout);
        drop(worker_stdin);

        tokio::time::timeout(Duration::from_secs(1), async {
            while rig.sidecar.is_running() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let error = rig
            .bridge
            .invoke("get_data_stats", json!({}))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            BridgeError::DispatchFailure {
                source: TransportError::WorkerUnavailable,
                ..
            }
        ));
        assert_eq!(rig.bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_host_command_is_dispatch_failure() {
        let (rig, worker_stdin, worker_stdout) = rig(PathBuf::from("/nonexistent/data"));
        let _worker = echo_worker(worker_stdin, worker_stdout);

        let error = rig
            .bridge
            .invoke("delete_everything", json!({}))
            .await
            .unwrap_err();

        assert!(error.is_dispatch_failure());
        assert_eq!(error.command(), Some("delete_everything"));
        assert_eq!(rig.bridge.pending_count(), 0);
    }
}
