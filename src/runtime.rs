//! Startup sequence and threads of control.
//!
//! [`Thermistron::init`] builds the store and the acquisition engine; nothing
//! runs yet. [`Thermistron::start`] spawns the three long-lived threads:
//! `sampler`, `serial-rx` and `serial-dispatch`. No thread is created after
//! that.

use crate::acquisition::AcquisitionEngine;
use crate::adc::{AdcSettings, AdcUnit};
use crate::command::{self, CommandInterface};
use crate::error::{MonitorError, Result};
use crate::io::{LineSink, LineSource};
use crate::store::ConfigStore;
use log::info;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Fully initialized monitor, not yet running.
#[derive(Debug)]
pub struct Thermistron<A: AdcUnit + 'static> {
    store: Arc<ConfigStore<A>>,
    engine: Arc<AcquisitionEngine<A>>,
    commands: Arc<CommandInterface<A>>,
}

impl<A: AdcUnit + 'static> Thermistron<A> {
    /// Initialize with board defaults and default ADC settings.
    pub fn init(adc: A) -> Result<Self> {
        Self::with_store(Arc::new(ConfigStore::new(adc)), AdcSettings::default())
    }

    /// Initialize around an existing store.
    ///
    /// Fails when the store no longer holds its ADC unit.
    pub fn with_store(store: Arc<ConfigStore<A>>, settings: AdcSettings) -> Result<Self> {
        let engine = Arc::new(AcquisitionEngine::init_with(store.clone(), settings)?);
        let commands = Arc::new(CommandInterface::new(store.clone(), engine.clone()));
        Ok(Self {
            store,
            engine,
            commands,
        })
    }

    /// Shared configuration store.
    pub fn store(&self) -> &Arc<ConfigStore<A>> {
        &self.store
    }

    /// Acquisition engine.
    pub fn engine(&self) -> &Arc<AcquisitionEngine<A>> {
        &self.engine
    }

    /// Command interface.
    pub fn commands(&self) -> &Arc<CommandInterface<A>> {
        &self.commands
    }

    /// Spawn the sampler, receiver and dispatcher threads.
    pub fn start<S, K>(self, source: S, sink: K) -> Result<RunningMonitor<A>>
    where
        S: LineSource + Send + 'static,
        K: LineSink + Send + 'static,
    {
        let engine = self.engine.clone();
        let sampler = thread::Builder::new()
            .name("sampler".into())
            .spawn(move || {
                engine.run_loop();
            })
            .map_err(MonitorError::Spawn)?;

        let (tx, rx) = command::command_queue();

        let receiver = thread::Builder::new()
            .name("serial-rx".into())
            .spawn(move || command::run_receiver(source, tx))
            .map_err(MonitorError::Spawn)?;

        let commands = self.commands.clone();
        let dispatcher = thread::Builder::new()
            .name("serial-dispatch".into())
            .spawn(move || commands.run_dispatcher(rx, sink))
            .map_err(MonitorError::Spawn)?;

        info!("Monitor running");
        Ok(RunningMonitor {
            monitor: self,
            sampler,
            receiver,
            dispatcher,
        })
    }
}

/// Handle to a started monitor.
#[derive(Debug)]
pub struct RunningMonitor<A: AdcUnit + 'static> {
    monitor: Thermistron<A>,
    sampler: JoinHandle<()>,
    receiver: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl<A: AdcUnit + 'static> RunningMonitor<A> {
    /// Shared configuration store.
    pub fn store(&self) -> &Arc<ConfigStore<A>> {
        self.monitor.store()
    }

    /// Acquisition engine.
    pub fn engine(&self) -> &Arc<AcquisitionEngine<A>> {
        self.monitor.engine()
    }

    /// Whether all three threads are still running.
    pub fn is_running(&self) -> bool {
        !self.sampler.is_finished() && !self.receiver.is_finished() && !self.dispatcher.is_finished()
    }

    /// Block until the serial threads stop.
    ///
    /// They stop only when the transport side shuts the queue down; the
    /// sampler is left running.
    pub fn join(self) -> Result<()> {
        for handle in [self.receiver, self.dispatcher] {
            handle
                .join()
                .map_err(|_| MonitorError::Transport(String::from("serial thread panicked")))?;
        }
        Ok(())
    }
}
