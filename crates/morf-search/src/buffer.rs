//! Job buffer
//!
//! Linkers wait here until a simulation slot is free. The lowest priority
//! value is submitted first, ties in insertion order. At most
//! `max_simulation` simulations run at once; a slot is released once the
//! simulation output shows up and the property has been computed.
use crate::computation::Computation;
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Hands a linker to the simulation backend.
pub trait Submitter {
    fn submit(&self, linker: &str) -> Result<()>;
}

/// Runs `<program> <linker> <queue>` in the buffer directory.
#[derive(Debug, Clone)]
pub struct CommandSubmitter {
    program: String,
    queue: String,
    work_dir: PathBuf,
}

impl CommandSubmitter {
    pub fn new(program: impl Into<String>, queue: impl Into<String>, work_dir: &Path) -> Self {
        Self {
            program: program.into(),
            queue: queue.into(),
            work_dir: work_dir.to_path_buf(),
        }
    }
}

impl Submitter for CommandSubmitter {
    fn submit(&self, linker: &str) -> Result<()> {
        let output = Command::new(&self.program)
            .arg(linker)
            .arg(&self.queue)
            .current_dir(&self.work_dir)
            .output()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(Error::Submit {
                linker: linker.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
struct QueuedJob {
    priority: f64,
    seq: u64,
    linker: String,
}

// BinaryHeap is a max-heap; invert so the smallest priority pops first.
impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedJob {}

pub struct JobBuffer<S = CommandSubmitter> {
    queue: BinaryHeap<QueuedJob>,
    running: Vec<String>,
    max_simulation: usize,
    submitter: S,
    next_seq: u64,
    all_submitted: bool,
}

impl<S: Submitter> JobBuffer<S> {
    pub fn new(submitter: S, max_simulation: usize) -> Self {
        Self {
            queue: BinaryHeap::new(),
            running: Vec::new(),
            max_simulation: max_simulation.max(1),
            submitter,
            next_seq: 0,
            all_submitted: false,
        }
    }

    pub fn add(&mut self, linker: impl Into<String>, priority: f64) {
        let linker = linker.into();
        debug!("queued linker {} with priority {}", linker, priority);
        self.queue.push(QueuedJob {
            priority,
            seq: self.next_seq,
            linker,
        });
        self.next_seq += 1;
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn on_simulation(&self) -> usize {
        self.running.len()
    }

    pub fn running(&self) -> &[String] {
        &self.running
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    pub fn can_feed_in(&self) -> bool {
        !self.queue.is_empty() && self.running.len() < self.max_simulation
    }

    /// No more linkers will be added.
    pub fn mark_all_submitted(&mut self) {
        self.all_submitted = true;
    }

    /// Submits the next job. Returns `true` once every slot is taken.
    pub fn simulate(&mut self) -> Result<bool> {
        let job = self.queue.pop().ok_or(Error::EmptyBuffer)?;
        if let Err(e) = self.submitter.submit(&job.linker) {
            self.queue.push(job);
            return Err(e);
        }
        self.running.push(job.linker.clone());
        info!(
            "Job {} submitted with priority {}. Currently on simulation: {}",
            job.linker,
            job.priority,
            self.running.len()
        );
        Ok(self.running.len() == self.max_simulation)
    }

    /// Collects finished simulations, writing `<linker> <property>` lines to
    /// `sink`. Returns `true` when the buffer is drained and nothing else will
    /// arrive.
    pub fn check_finished<W: Write>(
        &mut self,
        computation: &Computation,
        sink: &mut W,
    ) -> Result<bool> {
        let mut idx = 0;
        while idx < self.running.len() {
            let linker = &self.running[idx];
            if !computation.is_simulated(linker) {
                idx += 1;
                continue;
            }
            // a failing property script leaves the job in its slot
            let value = match computation.calculate_property(linker) {
                Ok(value) => value,
                Err(e) => {
                    sink.flush()?;
                    return Err(e);
                }
            };
            writeln!(sink, "{} {}", linker, value)?;
            info!("Job {} finished: {}", linker, value);
            self.running.remove(idx);
        }
        sink.flush()?;
        Ok(self.all_submitted && self.queue.is_empty() && self.running.is_empty())
    }

    /// Submits and collects until every job has finished.
    pub fn run_to_completion<W: Write>(
        &mut self,
        computation: &Computation,
        sink: &mut W,
        poll_interval: Duration,
    ) -> Result<()> {
        if !self.all_submitted {
            warn!("draining a buffer that may still receive jobs");
            self.all_submitted = true;
        }
        loop {
            while self.can_feed_in() {
                if self.simulate()? {
                    break;
                }
            }
            if self.check_finished(computation, sink)? {
                return Ok(());
            }
            thread::sleep(poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        submitted: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl Submitter for Recorder {
        fn submit(&self, linker: &str) -> Result<()> {
            if self.fail_on == Some(linker) {
                return Err(Error::Submit {
                    linker: linker.to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: String::new(),
                });
            }
            self.submitted.borrow_mut().push(linker.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_lowest_priority_first_then_fifo() {
        let mut buffer = JobBuffer::new(Recorder::default(), 10);
        buffer.add("c", 0.9);
        buffer.add("a", 0.1);
        buffer.add("b1", 0.5);
        buffer.add("b2", 0.5);
        while buffer.can_feed_in() {
            buffer.simulate().unwrap();
        }
        assert_eq!(
            *buffer.submitter().submitted.borrow(),
            vec!["a", "b1", "b2", "c"]
        );
        assert_eq!(buffer.on_simulation(), 4);
    }

    #[test]
    fn test_slots_are_limited() {
        let mut buffer = JobBuffer::new(Recorder::default(), 2);
        for (i, linker) in ["x", "y", "z"].iter().enumerate() {
            buffer.add(*linker, i as f64);
        }
        assert!(!buffer.simulate().unwrap());
        assert!(buffer.simulate().unwrap());
        assert!(!buffer.can_feed_in());
        assert_eq!(buffer.queued(), 1);
    }

    #[test]
    fn test_empty_buffer() {
        let mut buffer = JobBuffer::new(Recorder::default(), 2);
        assert!(!buffer.can_feed_in());
        assert!(matches!(buffer.simulate(), Err(Error::EmptyBuffer)));
    }

    #[test]
    fn test_failed_submission_is_requeued() {
        let recorder = Recorder {
            fail_on: Some("bad"),
            ..Default::default()
        };
        let mut buffer = JobBuffer::new(recorder, 2);
        buffer.add("bad", 0.0);
        assert!(buffer.simulate().is_err());
        assert_eq!(buffer.queued(), 1);
        assert_eq!(buffer.on_simulation(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_check_finished_releases_slots() {
        use morf_core::{FeatureKind, PropertyKind};
        use std::fs;

        let temp = tempfile::tempdir().unwrap();
        let run_dir = temp.path().join("run");
        let learn_dir = temp.path().join("learn");
        fs::create_dir_all(learn_dir.join("computation")).unwrap();
        fs::write(learn_dir.join("computation/calcStiff.py"), "cat \"$1\"\n").unwrap();
        let computation = Computation::new(
            &run_dir,
            &learn_dir,
            FeatureKind::Point,
            PropertyKind::Stiff,
            "sh",
        )
        .unwrap();

        let mut buffer = JobBuffer::new(Recorder::default(), 10);
        buffer.add("1", 0.2);
        buffer.add("2", 0.1);
        buffer.mark_all_submitted();
        buffer.simulate().unwrap();
        buffer.simulate().unwrap();

        let mut sink = Vec::new();
        assert!(!buffer.check_finished(&computation, &mut sink).unwrap());
        assert!(sink.is_empty());

        let output = computation.simulation_output("1");
        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(&output, "1.25").unwrap();
        assert!(!buffer.check_finished(&computation, &mut sink).unwrap());
        assert_eq!(buffer.running(), &["2".to_string()]);

        let output = computation.simulation_output("2");
        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(&output, "0.5").unwrap();
        assert!(buffer.check_finished(&computation, &mut sink).unwrap());
        assert_eq!(String::from_utf8(sink).unwrap(), "1 1.25\n2 0.5\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_property_keeps_job_running() {
        use morf_core::{FeatureKind, PropertyKind};
        use std::fs;
        use std::io::BufWriter;

        let temp = tempfile::tempdir().unwrap();
        let run_dir = temp.path().join("run");
        let learn_dir = temp.path().join("learn");
        fs::create_dir_all(learn_dir.join("computation")).unwrap();
        fs::write(
            learn_dir.join("computation/calcStiff.py"),
            "case \"$1\" in *linker3-*) echo broken >&2; exit 1;; esac\ncat \"$1\"\n",
        )
        .unwrap();
        let computation = Computation::new(
            &run_dir,
            &learn_dir,
            FeatureKind::Point,
            PropertyKind::Stiff,
            "sh",
        )
        .unwrap();

        let mut buffer = JobBuffer::new(Recorder::default(), 10);
        buffer.add("1", 0.1);
        buffer.add("3", 0.2);
        buffer.mark_all_submitted();
        buffer.simulate().unwrap();
        buffer.simulate().unwrap();
        for (linker, value) in [("1", "1.25"), ("3", "9.0")] {
            let output = computation.simulation_output(linker);
            fs::create_dir_all(output.parent().unwrap()).unwrap();
            fs::write(&output, value).unwrap();
        }

        let mut sink = BufWriter::new(Vec::new());
        assert!(matches!(
            buffer.check_finished(&computation, &mut sink),
            Err(Error::Script { .. })
        ));
        assert_eq!(buffer.running(), &["3".to_string()]);
        assert_eq!(sink.get_ref().as_slice(), b"1 1.25\n");
    }
}
