//! # Bridge Flows
//!
//! The command bridge wired to a real `OutputEventBus` and a channel
//! transport. A scripted worker task reads dispatched requests and answers
//! on the bus the way the worker's stdout would: several lines per chunk,
//! log noise in between, replies in any order.

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use engine_bridge::ipc::channel::{create_channel, DispatchedRequest};
    use engine_bridge::{BridgeConfig, BridgeError, CommandBridge, ResponseStatus};
    use engine_bus::OutputEventBus;
    use serde_json::{json, Value};
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::task::JoinSet;

    const EVENT: &str = "python-response";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn setup(config: BridgeConfig) -> (
        Arc<CommandBridge>,
        Arc<OutputEventBus>,
        UnboundedReceiver<DispatchedRequest>,
    ) {
        let bus = Arc::new(OutputEventBus::new());
        let (transport, rx) = create_channel();
        let bridge = CommandBridge::new(config, bus.clone(), Arc::new(transport)).unwrap();
        (Arc::new(bridge), bus, rx)
    }

    /// Answer for a request: echo the command and params back as data.
    fn answer(request: &DispatchedRequest) -> String {
        let mut line = json!({
            "status": "ok",
            "data": {"command": request.command, "params": request.payload},
            "request_id": request.request_id(),
        });
        if request.payload.get("fail").is_some() {
            line["status"] = json!("error");
            line["message"] = json!("requested failure");
        }
        line.to_string()
    }

    /// Collect `count` requests, then answer all of them in reverse order in
    /// one chunk with noise between the lines.
    async fn reverse_batch_worker(
        mut rx: UnboundedReceiver<DispatchedRequest>,
        bus: Arc<OutputEventBus>,
        count: usize,
    ) {
        let mut batch = Vec::with_capacity(count);
        while batch.len() < count {
            match rx.recv().await {
                Some(request) => batch.push(request),
                None => return,
            }
        }

        let mut chunk = String::from("[engine] batch start\n");
        for request in batch.iter().rev() {
            chunk.push_str(&answer(request));
            chunk.push('\n');
            chunk.push_str("{\"progress\": 0.5}\n");
        }
        chunk.push_str("{\"status\":\"ok\",\"message\":\"heartbeat\"}\n");
        bus.emit(EVENT, chunk);
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_batch_reply_routes_every_caller() {
        let (bridge, bus, rx) = setup(BridgeConfig::default());
        let worker = tokio::spawn(reverse_batch_worker(rx, bus, 4));

        let calls: Vec<(&'static str, Value)> = vec![
            ("load_data", json!({"file_path": "all"})),
            ("run_backtest", json!({"strategy": "s1"})),
            ("get_replay_state", json!({"period": "2024-001", "fail": true})),
            ("get_data_stats", Value::Null),
        ];

        let mut callers = JoinSet::new();
        for (i, (command, params)) in calls.into_iter().enumerate() {
            let bridge = bridge.clone();
            callers.spawn(async move { (i, command, bridge.invoke(command, params).await) });
        }

        let mut seen = 0;
        while let Some(joined) = callers.join_next().await {
            let (i, command, result) = joined.unwrap();
            let response = result.unwrap();
            let data = response.data().unwrap();
            assert_eq!(data["command"], engine_bridge::worker_command(command));

            if i == 2 {
                assert_eq!(response.status(), ResponseStatus::Error);
                assert_eq!(response.message(), Some("requested failure"));
            } else {
                assert_eq!(response.status(), ResponseStatus::Ok);
            }
            seen += 1;
        }
        worker.await.unwrap();

        assert_eq!(seen, 4);
        assert_eq!(bridge.pending_count(), 0);

        let stats = bridge.listener_stats();
        assert_eq!(stats.resolved.load(Ordering::Relaxed), 4);
        assert_eq!(stats.skipped_lines.load(Ordering::Relaxed), 1);
        assert_eq!(stats.ignored_lines.load(Ordering::Relaxed), 4);
        assert_eq!(stats.uncorrelated.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_worker_times_out_only_the_waiting_call() {
        let config = BridgeConfig::default().with_default_timeout(Duration::from_millis(200));
        let (bridge, bus, mut rx) = setup(config);

        let slow = {
            let bridge = bridge.clone();
            tokio::spawn(async move { bridge.invoke("run_backtest", json!({})).await })
        };
        let fast = {
            let bridge = bridge.clone();
            tokio::spawn(async move { bridge.invoke("get_data_stats", json!({})).await })
        };

        let mut requests = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        requests.retain(|r| r.command == "get_data_stats");
        bus.emit(EVENT, answer(&requests[0]));

        assert!(fast.await.unwrap().unwrap().is_ok());

        let error = slow.await.unwrap().unwrap_err();
        match error {
            BridgeError::Timeout { command, timeout } => {
                assert_eq!(command, "run_backtest");
                assert_eq!(timeout, Duration::from_millis(200));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_caller_request_id_is_replaced() {
        let (bridge, bus, mut rx) = setup(BridgeConfig::default());

        let caller = {
            let bridge = bridge.clone();
            tokio::spawn(async move {
                bridge
                    .invoke("get_data_stats", json!({"request_id": "spoofed"}))
                    .await
            })
        };

        let request = rx.recv().await.unwrap();
        assert_ne!(request.request_id(), Some("spoofed"));

        // A reply carrying the caller's id does not settle anything.
        bus.emit(
            EVENT,
            json!({"status": "ok", "request_id": "spoofed"}).to_string(),
        );
        bus.emit(EVENT, answer(&request));

        assert!(caller.await.unwrap().unwrap().is_ok());
        assert_eq!(
            bridge.listener_stats().unmatched.load(Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_two_bridges_on_one_bus_do_not_steal_replies() {
        let bus = Arc::new(OutputEventBus::new());
        let (transport_a, mut rx_a) = create_channel();
        let (transport_b, mut rx_b) = create_channel();
        let bridge_a = Arc::new(
            CommandBridge::new(BridgeConfig::default(), bus.clone(), Arc::new(transport_a)).unwrap(),
        );
        let bridge_b = Arc::new(
            CommandBridge::new(BridgeConfig::default(), bus.clone(), Arc::new(transport_b)).unwrap(),
        );

        let call_a = {
            let bridge = bridge_a.clone();
            tokio::spawn(async move { bridge.invoke("get_data_stats", json!({"who": "a"})).await })
        };
        let call_b = {
            let bridge = bridge_b.clone();
            tokio::spawn(async move { bridge.invoke("get_data_stats", json!({"who": "b"})).await })
        };

        let request_a = rx_a.recv().await.unwrap();
        let request_b = rx_b.recv().await.unwrap();
        assert_eq!(bus.subscriber_count(EVENT), 2);

        bus.emit(EVENT, format!("{}\n{}\n", answer(&request_b), answer(&request_a)));

        let a = call_a.await.unwrap().unwrap();
        let b = call_b.await.unwrap().unwrap();
        assert_eq!(a.data().unwrap()["params"]["who"], "a");
        assert_eq!(b.data().unwrap()["params"]["who"], "b");
    }
}
