use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use orbit_remote_rs::config::RemoteConfig;
use orbit_remote_rs::messages::Ping;
use orbit_remote_rs::remote::Remote;
use orbit_remote_rs::response_status_code::ResponseStatusCode;
use orbit_remote_rs::system::{
  ActorSystem, Envelope, Pid, Process, Props, SystemEvent, SystemMessage, Terminated, TerminatedReason, Watch,
};
use orbit_remote_rs::transport::{LoopbackNetwork, LoopbackTransport};

const TIMEOUT: Duration = Duration::from_secs(5);

struct Recorder {
  system: Mutex<Vec<SystemMessage>>,
}

impl Recorder {
  fn new() -> Arc<Self> {
    Arc::new(Self { system: Mutex::new(Vec::new()) })
  }

  fn terminated(&self) -> Vec<Terminated> {
    self
      .system
      .lock()
      .iter()
      .filter_map(|m| match m {
        | SystemMessage::Terminated(t) => Some(t.clone()),
        | _ => None,
      })
      .collect()
  }
}

impl Process for Recorder {
  fn send_user_message(&self, _target: &Pid, _envelope: Envelope) {}

  fn send_system_message(&self, _target: &Pid, message: SystemMessage) {
    self.system.lock().push(message);
  }
}

struct Sink;

impl Process for Sink {
  fn send_user_message(&self, _target: &Pid, _envelope: Envelope) {}

  fn send_system_message(&self, _target: &Pid, _message: SystemMessage) {}
}

async fn start_node(network: &LoopbackNetwork, config: RemoteConfig) -> (ActorSystem, Remote) {
  let _ = tracing_subscriber::fmt().with_test_writer().try_init();
  let system = ActorSystem::new();
  let transport = Arc::new(LoopbackTransport::new(network.clone()));
  let remote = Remote::with_transport(system.clone(), config, transport);
  remote.start().await.unwrap();
  (system, remote)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
  for _ in 0..500 {
    if condition() {
      return;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  panic!("condition not met in time");
}

#[tokio::test]
async fn retry_exhaustion_terminates_endpoint_and_dead_letters() {
  let network = LoopbackNetwork::new();
  let config = RemoteConfig::new("node-a", 9000)
    .with_max_retry_count(2)
    .with_retry_interval(Duration::from_millis(10));
  let (system_a, remote_a) = start_node(&network, config).await;

  let terminated_addresses: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
  let dead_letters: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
  let terminated_sink = terminated_addresses.clone();
  let dead_letter_sink = dead_letters.clone();
  system_a.event_stream().subscribe(move |event| match event {
    | SystemEvent::EndpointTerminated(terminated) => terminated_sink.lock().push(terminated.address.clone()),
    | SystemEvent::DeadLetter(dead_letter) => dead_letter_sink.lock().push(dead_letter.target.id().to_string()),
    | SystemEvent::EndpointConnected(_) => {},
  });

  // nothing listens on node-x, every connect attempt fails
  remote_a.send_message(&Pid::new("node-x:9000", "worker"), Arc::new(Ping), None, None);

  wait_until(|| !dead_letters.lock().is_empty()).await;
  assert_eq!(*terminated_addresses.lock(), vec!["node-x:9000".to_string()]);
  assert_eq!(*dead_letters.lock(), vec!["worker".to_string()]);
}

#[tokio::test]
async fn watchers_get_exactly_one_termination_per_watchee() {
  let network = LoopbackNetwork::new();
  let (system_a, remote_a) = start_node(&network, RemoteConfig::new("node-a", 9000)).await;
  let (_system_b, _remote_b) = start_node(
    &network,
    RemoteConfig::new("node-b", 9000).with_kind("sink", Props::from_producer(|_| Arc::new(Sink))),
  )
  .await;

  let recorder = Recorder::new();
  assert!(system_a.process_registry().add("observer", recorder.clone()));
  let watcher = system_a.local_pid("observer");

  let first = remote_a
    .spawn_remote_named("node-b:9000", "one", "sink", TIMEOUT)
    .await
    .unwrap();
  assert_eq!(first.status_code, ResponseStatusCode::Ok.as_u32());
  let second = remote_a
    .spawn_remote_named("node-b:9000", "two", "sink", TIMEOUT)
    .await
    .unwrap();
  let first_pid = first.pid.unwrap();
  let second_pid = second.pid.unwrap();

  system_a.send_system(&first_pid, SystemMessage::Watch(Watch { watcher: watcher.clone() }));
  system_a.send_system(&second_pid, SystemMessage::Watch(Watch { watcher: watcher.clone() }));

  // simulate failure detection for the peer's address
  let event = SystemEvent::EndpointTerminated(orbit_remote_rs::messages::EndpointTerminatedEvent {
    address: "node-b:9000".to_string(),
  });
  system_a.event_stream().publish(&event);
  system_a.event_stream().publish(&event);

  wait_until(|| recorder.terminated().len() >= 2).await;
  tokio::time::sleep(Duration::from_millis(50)).await;

  let terminated = recorder.terminated();
  assert_eq!(terminated.len(), 2);
  assert!(terminated.iter().all(|t| t.why == TerminatedReason::AddressTerminated));
  let mut who: Vec<String> = terminated.iter().map(|t| t.who.id().to_string()).collect();
  who.sort();
  assert_eq!(who, vec!["Remote$one".to_string(), "Remote$two".to_string()]);
}

#[tokio::test]
async fn shutdown_dead_letters_later_sends() {
  let network = LoopbackNetwork::new();
  let (system_a, remote_a) = start_node(&network, RemoteConfig::new("node-a", 9000)).await;

  let dead_letters: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
  let sink = dead_letters.clone();
  system_a.event_stream().subscribe(move |event| {
    if let SystemEvent::DeadLetter(dead_letter) = event {
      sink.lock().push(dead_letter.target.id().to_string());
    }
  });

  remote_a.shutdown(true).await;
  remote_a.send_message(&Pid::new("node-b:9000", "worker"), Arc::new(Ping), None, None);

  assert_eq!(*dead_letters.lock(), vec!["worker".to_string()]);
}
