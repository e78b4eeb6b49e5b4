use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::block_list::BlockList;
use crate::config::RemoteConfig;
use crate::endpoint::endpoint_manager::EndpointManager;
use crate::endpoint::endpoint_supervisor::EndpointSupervisor;
use crate::endpoint::endpoint_writer_mailbox::Dispatcher;
use crate::messages::{EndpointConnectedEvent, EndpointTerminatedEvent, Ping, RemoteDeliver, RemoteWatch};
use crate::serializer::SerializerManager;
use crate::system::{ActorSystem, Envelope, Pid, Process, SystemEvent, SystemMessage};
use crate::transport::{LoopbackNetwork, LoopbackTransport};

struct Recorder {
  system: Mutex<Vec<SystemMessage>>,
}

impl Recorder {
  fn new() -> Arc<Self> {
    Arc::new(Self { system: Mutex::new(Vec::new()) })
  }
}

impl Process for Recorder {
  fn send_user_message(&self, _target: &Pid, _envelope: Envelope) {}

  fn send_system_message(&self, _target: &Pid, message: SystemMessage) {
    self.system.lock().push(message);
  }
}

fn started_manager(system: &ActorSystem) -> EndpointManager {
  let manager = EndpointManager::new(system.clone());
  let config = RemoteConfig::new("127.0.0.1", 0)
    .with_max_retry_count(1)
    .with_retry_interval(Duration::from_millis(10));
  let transport = Arc::new(LoopbackTransport::new(LoopbackNetwork::new()));
  manager.start(EndpointSupervisor::new(
    system.clone(),
    config,
    transport,
    SerializerManager::new(),
    BlockList::new(),
    Dispatcher::new(),
  ));
  manager
}

fn dead_letter_targets(system: &ActorSystem) -> Arc<Mutex<Vec<String>>> {
  let targets: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
  let sink = targets.clone();
  system.event_stream().subscribe(move |event| {
    if let SystemEvent::DeadLetter(dead_letter) = event {
      sink.lock().push(dead_letter.target.id().to_string());
    }
  });
  targets
}

fn deliver_to(address: &str, id: &str) -> RemoteDeliver {
  RemoteDeliver { header: None, message: Arc::new(Ping), target: Pid::new(address, id), sender: None }
}

#[tokio::test]
async fn ensure_connected_yields_one_endpoint_per_address() {
  let system = ActorSystem::new();
  let manager = started_manager(&system);

  let first = manager.ensure_connected("10.9.9.9:1").unwrap();
  let second = manager.ensure_connected("10.9.9.9:1").unwrap();

  first.writer_mailbox().post_user_message(deliver_to("10.9.9.9:1", "a")).ok().unwrap();
  assert_eq!(second.writer_mailbox().user_message_count(), 1);
}

#[tokio::test]
async fn stopped_manager_dead_letters_deliveries() {
  let system = ActorSystem::new();
  let manager = started_manager(&system);
  let dead_letters = dead_letter_targets(&system);

  manager.stop(false);
  manager.deliver(deliver_to("10.9.9.9:1", "a"));

  assert_eq!(*dead_letters.lock(), vec!["a".to_string()]);
}

#[tokio::test]
async fn duplicate_terminated_event_unloads_once() {
  let system = ActorSystem::new();
  let manager = started_manager(&system);
  let dead_letters = dead_letter_targets(&system);

  manager.deliver(deliver_to("10.9.9.9:1", "a"));
  manager.deliver(deliver_to("10.9.9.9:1", "b"));
  assert!(dead_letters.lock().is_empty());

  let event = SystemEvent::EndpointTerminated(EndpointTerminatedEvent { address: "10.9.9.9:1".to_string() });
  system.event_stream().publish(&event);
  assert_eq!(dead_letters.lock().len(), 2);

  system.event_stream().publish(&event);
  assert_eq!(dead_letters.lock().len(), 2);
}

#[tokio::test]
async fn unloaded_address_respawns_on_next_delivery() {
  let system = ActorSystem::new();
  let manager = started_manager(&system);
  let dead_letters = dead_letter_targets(&system);

  manager.deliver(deliver_to("10.9.9.9:1", "a"));
  let event = SystemEvent::EndpointTerminated(EndpointTerminatedEvent { address: "10.9.9.9:1".to_string() });
  system.event_stream().publish(&event);
  assert_eq!(dead_letters.lock().len(), 1);

  let endpoint = manager.ensure_connected("10.9.9.9:1").unwrap();
  endpoint.writer_mailbox().post_user_message(deliver_to("10.9.9.9:1", "c")).ok().unwrap();
  assert_eq!(endpoint.writer_mailbox().user_message_count(), 1);
}

#[tokio::test]
async fn connected_event_resolves_the_endpoint() {
  let system = ActorSystem::new();
  let manager = started_manager(&system);

  let event = SystemEvent::EndpointConnected(EndpointConnectedEvent { address: "10.9.9.9:1".to_string() });
  system.event_stream().publish(&event);

  assert!(manager.inner.connections.has("10.9.9.9:1"));
}

#[tokio::test]
async fn delivery_racing_an_unload_is_dead_lettered() {
  let system = ActorSystem::new();
  let manager = started_manager(&system);
  let dead_letters = dead_letter_targets(&system);

  manager.deliver(deliver_to("10.9.9.9:1", "early"));
  let lazy = manager.inner.connections.get("10.9.9.9:1").unwrap();
  manager.remove_endpoint("10.9.9.9:1");
  assert_eq!(*dead_letters.lock(), vec!["early".to_string()]);

  // a sender that resolved the slot before the unload must not strand its message
  manager.deliver_via(&lazy, deliver_to("10.9.9.9:1", "late"));

  assert_eq!(*dead_letters.lock(), vec!["early".to_string(), "late".to_string()]);
  assert_eq!(lazy.endpoint().unwrap().writer_mailbox().user_message_count(), 0);
}

#[tokio::test]
async fn remote_watch_after_stop_is_ignored() {
  let system = ActorSystem::new();
  system.process_registry().set_address("10.0.0.1:9000");
  let recorder = Recorder::new();
  assert!(system.process_registry().add("watcher", recorder.clone()));
  let manager = started_manager(&system);
  manager.stop(false);

  manager.remote_watch(RemoteWatch {
    watcher: system.local_pid("watcher"),
    watchee: Pid::new("10.9.9.9:1", "gone"),
  });

  assert!(recorder.system.lock().is_empty());
  assert!(!manager.inner.connections.has("10.9.9.9:1"));
}
