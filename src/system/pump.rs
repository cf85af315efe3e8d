//! Single-threaded, order-preserving job queues.
//!
//! A [`Pump`] is an unbounded channel drained by one tokio task. Jobs run strictly in
//! submission order and never concurrently with each other. Submission is a plain synchronous
//! call so the engine can post work from its own threads. A panicking job is caught and logged
//! at the job boundary and the pump moves on to the next job.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

/// A unit of work run on a pump.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
	Run(Job),
	Flush(oneshot::Sender<()>),
}

/// Handle to a running pump; clones submit to the same queue.
#[derive(Clone)]
pub struct Pump {
	name: &'static str,
	sender: mpsc::UnboundedSender<Message>,
}

impl Pump {
	/// Start a pump on the current tokio runtime.
	///
	/// # Arguments
	/// * `name` - Label used in log output.
	///
	/// # Returns
	/// A `Pump` whose task runs until every clone of it has been dropped.
	pub fn spawn(name: &'static str) -> Self {
		let (sender, mut receiver) = mpsc::unbounded_channel::<Message>();

		tokio::spawn(async move {
			debug!("Pump {} started", name);
			while let Some(message) = receiver.recv().await {
				match message {
					Message::Run(job) => {
						if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
							error!("Pump {}: job panicked: {}", name, panic_message(&panic));
						}
					}
					Message::Flush(done) => {
						let _ = done.send(());
					}
				}
			}
			debug!("Pump {} stopped", name);
		});

		Self { name, sender }
	}

	/// Queue a job behind every job submitted before it.
	///
	/// Returns `false` if the pump has stopped; the job is dropped unrun in that case.
	pub fn submit<F>(&self, job: F) -> bool
	where
		F: FnOnce() + Send + 'static,
	{
		if self.sender.send(Message::Run(Box::new(job))).is_err() {
			error!("Pump {}: stopped, dropping job", self.name);
			return false;
		}
		true
	}

	/// Wait until every job submitted before this call has run.
	pub async fn flush(&self) {
		let (done, wait) = oneshot::channel();
		if self.sender.send(Message::Flush(done)).is_ok() {
			let _ = wait.await;
		}
	}
}

fn panic_message(panic: &Box<dyn Any + Send>) -> &str {
	if let Some(message) = panic.downcast_ref::<&'static str>() {
		message
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message.as_str()
	} else {
		"unknown panic"
	}
}
