use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::convert::Convert;
use crate::error::TaskError;
use crate::ffmpeg::probe::StreamInfo;
use crate::strategy::Mode;
use crate::task::VideoTask;

/// Number of files converted in parallel unless overridden.
pub const DEFAULT_WORKERS: usize = 4;

/// Progress events sent by worker threads to the coordinating thread, which
/// owns the terminal UI and the error list. Per task the sequence is
/// Started -> Running -> Progress* -> Finished; Finished is sent exactly once
/// whether the task succeeded or failed.
pub enum DriverMessage {
    TaskStarted {
        slot: usize,
        task: VideoTask,
    },
    TaskRunning {
        slot: usize,
        task: VideoTask,
        mode: Mode,
        total_secs: f64,
        source_size: u64,
        info: Option<StreamInfo>,
    },
    TaskProgress {
        slot: usize,
        seconds: f64,
    },
    TaskFinished {
        slot: usize,
        task: VideoTask,
        result: Result<Mode, TaskError>,
    },
}

/// Outcome of a whole batch. `completed` counts every task that reached a
/// terminal state, failures included; `errors` holds exactly the failures.
pub struct BatchReport {
    pub completed: usize,
    pub errors: Vec<TaskError>,
}

pub struct BatchDriver {
    workers: usize,
    converter: Arc<dyn Convert>,
    stop: Arc<AtomicBool>,
}

impl BatchDriver {
    pub fn new(workers: usize, converter: Arc<dyn Convert>, stop: Arc<AtomicBool>) -> Self {
        BatchDriver {
            workers: workers.max(1),
            converter,
            stop,
        }
    }

    /// Run every task to a terminal state with bounded concurrency. Tasks are
    /// dispatched FIFO to `workers` threads; completion order is unordered.
    /// The calling thread aggregates events and failures, so `observe` sees
    /// every message without any locking of its own.
    pub fn process_all(
        &self,
        tasks: Vec<VideoTask>,
        observe: &mut dyn FnMut(&DriverMessage),
    ) -> BatchReport {
        let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));
        let completed = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();

        let mut handles = Vec::with_capacity(self.workers);
        for slot in 0..self.workers {
            let queue = Arc::clone(&queue);
            let completed = Arc::clone(&completed);
            let stop = Arc::clone(&self.stop);
            let converter = Arc::clone(&self.converter);
            let events = tx.clone();
            handles.push(thread::spawn(move || {
                worker_loop(slot, &queue, converter.as_ref(), &completed, &stop, &events);
            }));
        }
        // the receive loop below ends when the last worker drops its sender
        drop(tx);

        let mut errors = Vec::new();
        for msg in rx {
            observe(&msg);
            if let DriverMessage::TaskFinished { result: Err(err), .. } = msg {
                errors.push(err);
            }
        }

        for handle in handles {
            let _ = handle.join();
        }

        BatchReport {
            completed: completed.load(Ordering::SeqCst),
            errors,
        }
    }
}

fn worker_loop(
    slot: usize,
    queue: &Mutex<VecDeque<VideoTask>>,
    converter: &dyn Convert,
    completed: &AtomicUsize,
    stop: &AtomicBool,
    events: &Sender<DriverMessage>,
) {
    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let task = queue.lock().unwrap().pop_front();
        let Some(task) = task else { break };

        let result = converter.convert(slot, &task, events);
        completed.fetch_add(1, Ordering::SeqCst);
        let _ = events.send(DriverMessage::TaskFinished { slot, task, result });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use std::path::PathBuf;
    use std::time::Duration;

    /// Simulates per-task latency and scripted failures, and records the peak
    /// number of tasks in flight at once.
    struct FakeConvert {
        fail_keyword: &'static str,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeConvert {
        fn new(fail_keyword: &'static str) -> Self {
            FakeConvert {
                fail_keyword,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    impl Convert for FakeConvert {
        fn convert(
            &self,
            slot: usize,
            task: &VideoTask,
            events: &Sender<DriverMessage>,
        ) -> Result<Mode, TaskError> {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);

            let _ = events.send(DriverMessage::TaskStarted {
                slot,
                task: task.clone(),
            });
            thread::sleep(Duration::from_millis(5));
            let _ = events.send(DriverMessage::TaskProgress { slot, seconds: 1.0 });

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if task.file_name().contains(self.fail_keyword) {
                Err(TaskError::Probe(ProbeError::for_file(&task.source, "simulated failure")))
            } else {
                Ok(Mode::Copy)
            }
        }
    }

    fn tasks(names: &[&str]) -> Vec<VideoTask> {
        names
            .iter()
            .map(|name| VideoTask::for_source(PathBuf::from(format!("/in/{name}.mp4")), &PathBuf::from("/out"), false))
            .collect()
    }

    #[test]
    fn test_all_tasks_reach_terminal_state() {
        let converter = Arc::new(FakeConvert::new("bad"));
        let driver = BatchDriver::new(4, Arc::clone(&converter) as Arc<dyn Convert>, Arc::new(AtomicBool::new(false)));
        let names: Vec<String> = (0..32).map(|i| format!("clip{i}")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let mut finished = 0;
        let report = driver.process_all(tasks(&name_refs), &mut |msg| {
            if let DriverMessage::TaskFinished { .. } = msg {
                finished += 1;
            }
        });

        assert_eq!(report.completed, 32);
        assert_eq!(finished, 32);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_concurrency_never_exceeds_worker_bound() {
        let converter = Arc::new(FakeConvert::new("bad"));
        let driver = BatchDriver::new(4, Arc::clone(&converter) as Arc<dyn Convert>, Arc::new(AtomicBool::new(false)));
        let names: Vec<String> = (0..20).map(|i| format!("clip{i}")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let report = driver.process_all(tasks(&name_refs), &mut |_| {});

        assert_eq!(report.completed, 20);
        assert!(converter.max_in_flight.load(Ordering::SeqCst) <= 4);
    }

    #[test]
    fn test_failures_are_recorded_without_aborting_the_batch() {
        let converter = Arc::new(FakeConvert::new("bad"));
        let driver = BatchDriver::new(4, converter as Arc<dyn Convert>, Arc::new(AtomicBool::new(false)));

        let report = driver.process_all(
            tasks(&["good1", "bad1", "good2", "bad2", "good3", "bad3", "good4"]),
            &mut |_| {},
        );

        // both outcomes count as processed
        assert_eq!(report.completed, 7);
        assert_eq!(report.errors.len(), 3);
        for err in &report.errors {
            assert!(format!("{err}").contains("bad"));
        }
    }

    #[test]
    fn test_single_worker_processes_sequentially() {
        let converter = Arc::new(FakeConvert::new("bad"));
        let driver = BatchDriver::new(1, Arc::clone(&converter) as Arc<dyn Convert>, Arc::new(AtomicBool::new(false)));

        let report = driver.process_all(tasks(&["a", "b", "c"]), &mut |_| {});

        assert_eq!(report.completed, 3);
        assert_eq!(converter.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_worker_count_is_clamped_to_at_least_one() {
        let converter = Arc::new(FakeConvert::new("bad"));
        let driver = BatchDriver::new(0, converter as Arc<dyn Convert>, Arc::new(AtomicBool::new(false)));

        let report = driver.process_all(tasks(&["a", "b"]), &mut |_| {});
        assert_eq!(report.completed, 2);
    }

    #[test]
    fn test_stop_flag_prevents_new_dequeues() {
        let converter = Arc::new(FakeConvert::new("bad"));
        let stop = Arc::new(AtomicBool::new(true));
        let driver = BatchDriver::new(4, converter as Arc<dyn Convert>, stop);

        let report = driver.process_all(tasks(&["a", "b", "c"]), &mut |_| {});
        assert_eq!(report.completed, 0);
        assert!(report.errors.is_empty());
    }
}
