//! Drives a [`ViewModel`]: requests run as tokio tasks, their results and the countdown's
//! one-second ticks come back over a channel and are applied one at a time.

use anyhow::Result;
use newsdesk_client::{RequestResult, Transport};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::launcher::Launcher;
use crate::state::{LogLevel, ViewState};
use crate::viewmodel::{CountdownTick, Followup, Pending, Ticket, ViewModel};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug)]
enum Event {
    Completed(Ticket, RequestResult),
    Tick(u64),
}

pub struct Session<T: Transport, L: Launcher> {
    vm: ViewModel,
    transport: T,
    launcher: L,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    outstanding: usize,
    timer: Option<(u64, JoinHandle<()>)>,
}

impl<T: Transport, L: Launcher> Session<T, L> {
    pub fn new(vm: ViewModel, transport: T, launcher: L) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            vm,
            transport,
            launcher,
            tx,
            rx,
            outstanding: 0,
            timer: None,
        }
    }

    pub fn view(&self) -> &ViewModel {
        &self.vm
    }

    pub fn view_mut(&mut self) -> &mut ViewModel {
        &mut self.vm
    }

    pub fn state(&self) -> &ViewState {
        self.vm.state()
    }

    /// Begin an operation and send its request, if it produced one.
    ///
    /// ```rust,ignore
    /// session.issue(ViewModel::request_analysis);
    /// session.settle().await;
    /// ```
    pub fn issue<F>(&mut self, begin: F) -> bool
    where
        F: FnOnce(&mut ViewModel) -> Option<Pending>,
    {
        match begin(&mut self.vm) {
            Some(pending) => {
                self.dispatch(pending);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, pending: Pending) {
        let Pending { ticket, call } = pending;
        let transport = self.transport.clone();
        let tx = self.tx.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            let result = transport.send(call).await;
            // the session may be gone
            let _ = tx.send(Event::Completed(ticket, result));
        });
    }

    /// Apply the next event. Returns `false` when nothing is pending and no countdown runs.
    pub async fn step(&mut self) -> bool {
        if self.outstanding == 0 && self.timer.is_none() {
            return false;
        }
        match self.rx.recv().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    /// Wait until every issued request, followups included, has completed. A running
    /// countdown keeps ticking meanwhile.
    pub async fn settle(&mut self) {
        while self.outstanding > 0 {
            if !self.step().await {
                break;
            }
        }
    }

    /// Like [`settle()`], then also wait for the countdown to run out.
    ///
    /// [`settle()`]: #method.settle
    pub async fn drain(&mut self) {
        while self.step().await {}
    }

    /// Start the backend through the launcher and record the outcome.
    pub fn start_backend(&mut self) -> Result<()> {
        self.vm.log(LogLevel::Info, "Starting backend service...");
        match self.launcher.start_backend() {
            Ok(()) => {
                self.vm.log(LogLevel::Info, "Backend start requested");
                Ok(())
            }
            Err(e) => {
                self.vm
                    .log(LogLevel::Error, format!("Could not start backend: {e:#}"));
                Err(e)
            }
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Completed(ticket, result) => {
                self.outstanding = self.outstanding.saturating_sub(1);
                let followups = self.vm.complete(ticket, result);
                for followup in followups {
                    self.follow(followup);
                }
            }
            Event::Tick(epoch) => match self.vm.tick_countdown(epoch) {
                CountdownTick::Running(_) => {}
                CountdownTick::Expired => self.stop_timer(Some(epoch)),
                CountdownTick::Stale => self.stop_timer(Some(epoch)),
            },
        }
    }

    fn follow(&mut self, followup: Followup) {
        match followup {
            Followup::Issue(pending) => self.dispatch(pending),
            Followup::OpenReport(path) => match self.launcher.open_report(&path) {
                Ok(()) => self.vm.log(LogLevel::Info, "Opened report in browser"),
                Err(e) => self
                    .vm
                    .log(LogLevel::Warn, format!("Could not open browser: {e:#}")),
            },
            Followup::StartCountdown { epoch } => self.start_timer(epoch),
            Followup::StopCountdown => self.stop_timer(None),
        }
    }

    fn start_timer(&mut self, epoch: u64) {
        self.stop_timer(None);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick(epoch)).is_err() {
                    break;
                }
            }
        });
        self.timer = Some((epoch, handle));
    }

    /// Abort the timer, or only the timer of `epoch` when given.
    fn stop_timer(&mut self, epoch: Option<u64>) {
        let matches = match (&self.timer, epoch) {
            (Some((running, _)), Some(epoch)) => *running == epoch,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if matches {
            if let Some((_, handle)) = self.timer.take() {
                handle.abort();
            }
        }
    }
}

impl<T: Transport, L: Launcher> Drop for Session<T, L> {
    fn drop(&mut self) {
        self.stop_timer(None);
    }
}
