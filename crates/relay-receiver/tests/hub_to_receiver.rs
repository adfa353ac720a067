//! End-to-end: a real hub on loopback feeding a real receiver transport and
//! pipeline.

use std::net::SocketAddr;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use relay_core::{CalibrationMapper, Extent, MemoryStore, PointerEvent, SessionState};
use relay_hub::application::BroadcastHub;
use relay_hub::infrastructure::serve;
use relay_receiver::application::{CalibrationController, EventConsumer, ReceiverPipeline};
use relay_receiver::domain::ScreenGeometry;
use relay_receiver::infrastructure::render::mock::{MockRenderSurface, SurfaceCall};
use relay_receiver::infrastructure::tap::{mock::MockTapDispatcher, TapDispatcherRegistry};
use relay_receiver::infrastructure::transport::{
    websocket::WsConnector, SessionEvent, TransportConfig, TransportSession,
};

async fn start_hub() -> (SocketAddr, Arc<BroadcastHub>, Arc<AtomicBool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
    let addr = listener.local_addr().unwrap();
    let hub = Arc::new(BroadcastHub::new());
    let running = Arc::new(AtomicBool::new(true));
    tokio::spawn(serve(listener, Arc::clone(&hub), 16, Arc::clone(&running)));
    (addr, hub, running)
}

fn transport_for(addr: SocketAddr) -> TransportSession {
    let config = TransportConfig {
        reconnect_delay: Duration::from_millis(100),
        connect_timeout: Duration::from_secs(2),
        ..TransportConfig::new(format!("ws://{addr}"))
    };
    TransportSession::new(config, Arc::new(WsConnector))
}

async fn next_event(rx: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event within timeout")
        .expect("bus open")
}

async fn wait_for_sessions(hub: &BroadcastHub, n: usize) {
    for _ in 0..200 {
        if hub.session_count().await == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("hub never reached {n} sessions");
}

#[tokio::test]
async fn test_receiver_gets_broadcast_events_in_order() {
    // Arrange
    let (addr, hub, _running) = start_hub().await;
    let transport = transport_for(addr);
    let mut events = transport.subscribe();
    transport.connect();
    assert_eq!(next_event(&mut events).await, SessionEvent::Connected);
    wait_for_sessions(&hub, 1).await;

    // Act
    hub.broadcast(&PointerEvent::moved(10, 20)).await;
    hub.broadcast(&PointerEvent::click(30, 40)).await;

    // Assert: the greeting produced no event; the two broadcasts did.
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Pointer(PointerEvent::moved(10, 20))
    );
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Pointer(PointerEvent::click(30, 40))
    );
    assert_eq!(transport.state(), SessionState::Connected);
    transport.disconnect();
}

#[tokio::test]
async fn test_disconnect_unregisters_from_hub() {
    let (addr, hub, _running) = start_hub().await;
    let transport = transport_for(addr);
    let mut events = transport.subscribe();
    transport.connect();
    next_event(&mut events).await;
    wait_for_sessions(&hub, 1).await;

    transport.disconnect();

    assert_eq!(next_event(&mut events).await, SessionEvent::Disconnected);
    wait_for_sessions(&hub, 0).await;
}

#[tokio::test]
async fn test_unreachable_hub_reports_error_and_retries() {
    // Arrange: grab a free port, then close it
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let transport = transport_for(addr);
    let mut events = transport.subscribe();

    // Act
    transport.connect();

    // Assert
    assert!(matches!(next_event(&mut events).await, SessionEvent::Error(_)));
    assert!(matches!(next_event(&mut events).await, SessionEvent::Error(_)));
    transport.disconnect();
}

#[tokio::test]
async fn test_pipeline_maps_hub_events_onto_the_screen() {
    // Arrange
    let (addr, hub, _running) = start_hub().await;
    let (surface, probe) = MockRenderSurface::new();
    let registry = TapDispatcherRegistry::new();
    let taps = Arc::new(MockTapDispatcher::new());
    registry.register(taps.clone());
    let consumer = EventConsumer::new(Box::new(surface), registry, ScreenGeometry::new(1080, 2400));
    let calibration = Arc::new(CalibrationController::new(Arc::new(MemoryStore::new()), false));
    let pipeline = ReceiverPipeline::new(
        CalibrationMapper::from_extent(Extent::new(1920, 1080)),
        consumer,
        calibration,
    );

    let transport = transport_for(addr);
    let mut watch = transport.subscribe();
    let bus = transport.subscribe();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(pipeline.run(bus, async {
        let _ = stop_rx.await;
    }));
    transport.connect();
    next_event(&mut watch).await;
    wait_for_sessions(&hub, 1).await;

    // Act
    hub.broadcast(&PointerEvent::moved(960, 540)).await;
    hub.broadcast(&PointerEvent::click(480, 270)).await;
    next_event(&mut watch).await;
    next_event(&mut watch).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_tx.send(()).unwrap();
    let stats = task.await.unwrap();

    // Assert
    assert_eq!((stats.moves, stats.clicks), (1, 1));
    assert!(probe.calls().contains(&SurfaceCall::Update(540, 1200)));
    assert_eq!(taps.taps(), vec![(270, 600)]);
    transport.disconnect();
}
