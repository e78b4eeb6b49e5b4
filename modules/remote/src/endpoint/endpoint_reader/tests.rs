use std::sync::Arc;

use parking_lot::Mutex;

use crate::block_list::BlockList;
use crate::endpoint::endpoint_manager::EndpointManager;
use crate::endpoint::endpoint_reader::{EndpointReader, EndpointReaderError};
use crate::endpoint::endpoint_writer::build_message_batch;
use crate::messages::{Ping, RemoteDeliver};
use crate::serializer::{SerializerManager, SERIALIZER_ID_BINARY};
use crate::system::{ActorSystem, Envelope, Pid, Process, SystemMessage, Watch};
use crate::wire::{MessageBatch, MessageEnvelope};

struct Recorder {
  user:   Mutex<Vec<(Pid, Envelope)>>,
  system: Mutex<Vec<SystemMessage>>,
}

impl Recorder {
  fn new() -> Arc<Self> {
    Arc::new(Self { user: Mutex::new(Vec::new()), system: Mutex::new(Vec::new()) })
  }
}

impl Process for Recorder {
  fn send_user_message(&self, target: &Pid, envelope: Envelope) {
    self.user.lock().push((target.clone(), envelope));
  }

  fn send_system_message(&self, _target: &Pid, message: SystemMessage) {
    self.system.lock().push(message);
  }
}

struct Fixture {
  system:   ActorSystem,
  reader:   EndpointReader,
  recorder: Arc<Recorder>,
}

fn fixture() -> Fixture {
  let system = ActorSystem::new();
  system.process_registry().set_address("10.0.0.1:9000");
  let recorder = Recorder::new();
  assert!(system.process_registry().add("echo", recorder.clone()));
  let manager = EndpointManager::new(system.clone());
  let reader = EndpointReader::new(system.clone(), manager, SerializerManager::new(), BlockList::new());
  Fixture { system, reader, recorder }
}

fn echo_pid(fx: &Fixture) -> Pid {
  fx.system.local_pid("echo")
}

fn batch_for(deliveries: Vec<RemoteDeliver>) -> MessageBatch {
  build_message_batch(&SerializerManager::new(), deliveries).batch
}

#[test]
fn request_ids_are_stamped_back_onto_cloned_pids() {
  let fx = fixture();
  let target = echo_pid(&fx).with_request_id(3);
  let sender = Pid::new("10.0.0.2:9000", "caller").with_request_id(9);
  let batch = batch_for(vec![RemoteDeliver {
    header:  None,
    message: Arc::new(Ping),
    target:  target.clone(),
    sender:  Some(sender.clone()),
  }]);

  fx.reader.on_message_batch(&batch).unwrap();

  let user = fx.recorder.user.lock();
  assert_eq!(user.len(), 1);
  assert_eq!(user[0].0, target);
  assert_eq!(user[0].1.sender(), Some(&sender));
}

#[test]
fn sender_index_zero_means_no_sender() {
  let fx = fixture();
  let batch = batch_for(vec![RemoteDeliver {
    header:  None,
    message: Arc::new(Ping),
    target:  echo_pid(&fx),
    sender:  None,
  }]);

  fx.reader.on_message_batch(&batch).unwrap();

  let user = fx.recorder.user.lock();
  assert_eq!(user.len(), 1);
  assert!(user[0].1.sender().is_none());
}

#[test]
fn decode_failure_aborts_the_whole_batch() {
  let fx = fixture();
  let batch = MessageBatch {
    type_names: vec!["orbit.ActorPidRequest".to_string()],
    targets:    vec![echo_pid(&fx)],
    senders:    vec![],
    envelopes:  vec![
      MessageEnvelope {
        type_id:           0,
        message_data:      vec![0xFF, 0xFF, 0xFF, 0xFF],
        target:            0,
        sender:            0,
        serializer_id:     SERIALIZER_ID_BINARY,
        target_request_id: 0,
        sender_request_id: 0,
        message_header:    None,
      },
      MessageEnvelope {
        type_id:           0,
        message_data:      vec![],
        target:            0,
        sender:            0,
        serializer_id:     SERIALIZER_ID_BINARY,
        target_request_id: 0,
        sender_request_id: 0,
        message_header:    None,
      },
    ],
  };

  let result = fx.reader.on_message_batch(&batch);
  assert!(matches!(result, Err(EndpointReaderError::Serializer(_))));
  assert!(fx.recorder.user.lock().is_empty());
}

#[test]
fn out_of_range_lookup_index_is_malformed() {
  let fx = fixture();
  let batch = MessageBatch {
    type_names: vec!["orbit.Ping".to_string()],
    targets:    vec![echo_pid(&fx)],
    senders:    vec![],
    envelopes:  vec![MessageEnvelope {
      type_id:           0,
      message_data:      vec![],
      target:            5,
      sender:            0,
      serializer_id:     SERIALIZER_ID_BINARY,
      target_request_id: 0,
      sender_request_id: 0,
      message_header:    None,
    }],
  };

  let result = fx.reader.on_message_batch(&batch);
  assert!(matches!(result, Err(EndpointReaderError::MalformedBatch(_))));
}

#[test]
fn watch_payload_routes_to_the_system_channel() {
  let fx = fixture();
  let watcher = Pid::new("10.0.0.2:9000", "watcher");
  let batch = batch_for(vec![RemoteDeliver {
    header:  None,
    message: Arc::new(Watch { watcher: watcher.clone() }),
    target:  echo_pid(&fx),
    sender:  None,
  }]);

  fx.reader.on_message_batch(&batch).unwrap();

  assert!(fx.recorder.user.lock().is_empty());
  let system = fx.recorder.system.lock();
  assert_eq!(system.len(), 1);
  assert!(matches!(&system[0], SystemMessage::Watch(w) if w.watcher == watcher));
}
