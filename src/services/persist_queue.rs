use crate::models::Device;
use crate::services::DeviceService;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

enum PersistTask {
    Register(Device),
    Checkin { key: String, at: DateTime<Utc> },
}

/// Hands committed registry changes to a single background writer.
///
/// Sending never waits: when the queue is full the change is logged and dropped,
/// the in-memory registry stays authoritative. The writer exits once every
/// handle is dropped and the queue is drained.
#[derive(Clone)]
pub struct PersistQueue {
    sender: mpsc::Sender<PersistTask>,
}

impl PersistQueue {
    pub fn spawn(service: Arc<DeviceService>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut tasks) = mpsc::channel::<PersistTask>(capacity);
        let handle = tokio::spawn(async move {
            while let Some(task) = tasks.recv().await {
                match task {
                    PersistTask::Register(device) => {
                        if let Err(err) = service.persist(&device).await {
                            tracing::error!(
                                reason = ?err,
                                "Failed to persist device {} ({})",
                                device.name,
                                device.mac
                            );
                        }
                    }
                    PersistTask::Checkin { key, at } => {
                        if let Err(err) = service.record_checkin(&key, at).await {
                            tracing::error!(reason = ?err, "Failed to persist check-in");
                        }
                    }
                }
            }
            tracing::debug!("Persist queue closed");
        });
        (Self { sender }, handle)
    }

    pub fn registered(&self, device: Device) {
        self.send(PersistTask::Register(device));
    }

    pub fn checked_in(&self, key: String, at: DateTime<Utc>) {
        self.send(PersistTask::Checkin { key, at });
    }

    fn send(&self, task: PersistTask) {
        if let Err(err) = self.sender.try_send(task) {
            tracing::error!("Dropped persistence task: {err}");
        }
    }
}
