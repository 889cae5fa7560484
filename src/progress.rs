use human_repr::HumanCount;
use kdam::{Bar, BarExt, term, tqdm};

use crate::driver::DriverMessage;
use crate::strategy::Mode;

/// Terminal progress display: an aggregate bar counting finished files plus
/// one reusable bar per worker slot showing encoded seconds for the file in
/// flight. Owned by the coordinating thread only; workers never touch the
/// terminal.
pub struct BatchProgress {
    overall: Bar,
    slots: Vec<Bar>,
}

impl BatchProgress {
    pub fn new(total_tasks: usize, workers: usize) -> Self {
        term::init(false);
        let overall = tqdm!(
            total = total_tasks,
            desc = "processing videos",
            position = 0,
            force_refresh = true
        );
        let slots = (0..workers)
            .map(|slot| {
                tqdm!(
                    total = 1,
                    desc = "idle",
                    unit = "s",
                    position = (slot + 1) as u16,
                    leave = false,
                    force_refresh = true
                )
            })
            .collect();
        BatchProgress { overall, slots }
    }

    pub fn observe(&mut self, msg: &DriverMessage) {
        match msg {
            DriverMessage::TaskStarted { slot, task } => {
                if let Some(bar) = self.slots.get_mut(*slot) {
                    bar.reset(Some(1));
                    bar.set_description(format!("probing {}", task.file_name()));
                    bar.set_postfix(String::new());
                    let _ = bar.refresh();
                }
            }
            DriverMessage::TaskRunning {
                slot,
                task,
                mode,
                total_secs,
                source_size,
                info,
            } => {
                let verb = match mode {
                    Mode::Copy => "remuxing",
                    Mode::Compress => "compressing",
                };
                if let Some(bar) = self.slots.get_mut(*slot) {
                    bar.reset(Some(total_secs.ceil().max(1.0) as usize));
                    bar.set_description(format!("{verb} {}", task.file_name()));
                    let postfix = match info {
                        Some(info) => format!("{info}, {}", source_size.human_count_bytes()),
                        None => format!("{}", source_size.human_count_bytes()),
                    };
                    bar.set_postfix(postfix);
                    let _ = bar.refresh();
                }
            }
            DriverMessage::TaskProgress { slot, seconds } => {
                if let Some(bar) = self.slots.get_mut(*slot) {
                    let _ = bar.update_to(seconds.round() as usize);
                }
            }
            DriverMessage::TaskFinished { slot, task, result } => {
                match result {
                    Ok(mode) => {
                        let _ = self.overall.write(format!("finished {} ({mode})", task.file_name()));
                    }
                    Err(err) => {
                        let _ = self.overall.write(format!("{err}"));
                    }
                }
                if let Some(bar) = self.slots.get_mut(*slot) {
                    bar.reset(Some(1));
                    bar.set_description("idle");
                    bar.set_postfix(String::new());
                    let _ = bar.refresh();
                }
                let _ = self.overall.update(1);
            }
        }
    }

    pub fn finish(&mut self) {
        for bar in &mut self.slots {
            let _ = bar.clear();
        }
        let _ = self.overall.refresh();
        println!();
    }
}
