use msrkit_device::Device;
use msrkit_transport::{HidTransport, Transport};
use tokio::runtime::Runtime;
use tracing::warn;

use crate::cmd::DeviceArgs;
use crate::exit::{
    device_error, io_error, transport_error, CliError, CliResult, INTERNAL, INTERRUPTED,
};

/// An open device plus the runtime that drives it.
///
/// Ctrl-C resets the device before exiting so that a pending swipe wait
/// does not leave it armed. Dropping the session, including on an error
/// path, resets and closes the device before the runtime shuts down; a
/// read still blocked in the transport only returns once it is closed.
pub struct Session<T: Transport = HidTransport> {
    runtime: Runtime,
    device: Option<Device<T>>,
}

impl Session<HidTransport> {
    pub fn open(args: &DeviceArgs) -> CliResult<Self> {
        let config = args.config()?;
        let transport = HidTransport::open().map_err(|e| transport_error("open", e))?;
        let session = Self::with_device(Device::with_config(transport, config))?;
        session.reset_on_interrupt();
        Ok(session)
    }

    /// Product and manufacturer strings reported over USB.
    pub fn hid_strings(&self) -> (Option<String>, Option<String>) {
        match &self.device {
            Some(device) => {
                let transport = device.transport();
                (
                    transport.product().map(str::to_string),
                    transport.manufacturer().map(str::to_string),
                )
            }
            None => (None, None),
        }
    }
}

impl<T: Transport> Session<T> {
    pub fn with_device(device: Device<T>) -> CliResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| io_error("runtime", e))?;
        Ok(Self {
            runtime,
            device: Some(device),
        })
    }

    fn reset_on_interrupt(&self) {
        let Some(device) = &self.device else {
            return;
        };
        let reset = device.reset_handle();
        self.runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            if let Err(err) = reset.reset().await {
                warn!(error = %err, "reset on interrupt failed");
            }
            eprintln!("interrupted");
            std::process::exit(INTERRUPTED);
        });
    }

    /// Run one device operation to completion.
    pub fn run<'a, F, Fut, R>(&'a mut self, context: &str, op: F) -> CliResult<R>
    where
        F: FnOnce(&'a mut Device<T>) -> Fut,
        Fut: std::future::Future<Output = msrkit_device::Result<R>>,
    {
        let device = self.device.as_mut().ok_or_else(already_closed)?;
        self.runtime
            .block_on(op(device))
            .map_err(|e| device_error(context, e))
    }

    /// Release the device without resetting it.
    pub fn release(mut self) -> CliResult<()> {
        let device = self.device.take().ok_or_else(already_closed)?;
        device
            .transport()
            .close()
            .map_err(|e| transport_error("close", e))
    }

    /// Reset and release the device.
    pub fn close(mut self) -> CliResult<()> {
        let device = self.device.take().ok_or_else(already_closed)?;
        self.runtime
            .block_on(device.close())
            .map_err(|e| device_error("close", e))
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if let Some(device) = self.device.take() {
            if let Err(err) = self.runtime.block_on(device.close()) {
                warn!(error = %err, "closing device on exit failed");
            }
        }
    }
}

fn already_closed() -> CliError {
    CliError::new(INTERNAL, "device session already closed")
}
