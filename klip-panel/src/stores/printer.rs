use klip_client::{ClientResult, Handlers, LinkEvent, PrinterInfo, PrinterLink, PrinterService};
use serde_json::Value;
use shared::gcode::GcodeBuilder;
use shared::printer::TemperatureLimits;
use shared::temperature::{Temperature, TemperaturePreset, adjusted_preset_temperature};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Status reported before the first successful info fetch
pub const UNKNOWN_STATUS: &str = "unknown";

/// Printer snapshot and the link that keeps it live
pub struct PrinterStore {
    printer: Arc<dyn PrinterService>,
    link: PrinterLink,
    info: RwLock<Option<PrinterInfo>>,
    status: RwLock<String>,
    connected: Arc<AtomicBool>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl PrinterStore {
    pub fn new(printer: Arc<dyn PrinterService>, link: PrinterLink) -> Self {
        Self {
            printer,
            link,
            info: RwLock::new(None),
            status: RwLock::new(UNKNOWN_STATUS.to_string()),
            connected: Arc::new(AtomicBool::new(false)),
            watcher: Mutex::new(None),
        }
    }

    pub fn link(&self) -> &PrinterLink {
        &self.link
    }

    pub fn printer_info(&self) -> Option<PrinterInfo> {
        self.info.read().map(|i| i.clone()).unwrap_or_default()
    }

    pub fn printer_status(&self) -> String {
        self.status
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|_| UNKNOWN_STATUS.to_string())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Refresh the snapshot; on failure the previous snapshot stays
    pub async fn fetch_printer_info(&self) -> ClientResult<PrinterInfo> {
        match self.printer.info().await {
            Ok(info) => {
                if let Ok(mut status) = self.status.write() {
                    *status = info.state.clone();
                }
                if let Ok(mut slot) = self.info.write() {
                    *slot = Some(info.clone());
                }
                Ok(info)
            }
            Err(e) => {
                tracing::error!("Failed to fetch printer info: {}", e);
                Err(e)
            }
        }
    }

    /// Open the link and track its connection state across reconnects
    pub fn init_websocket(&self) {
        {
            let mut watcher = self.lock_watcher();
            if watcher.is_none() {
                *watcher = Some(self.spawn_watcher());
            }
        }

        let connected = Arc::clone(&self.connected);
        let handlers = Handlers::new()
            .with_message(|data: &Value| {
                tracing::debug!(%data, "Printer data received");
            })
            .with_close(move || {
                connected.store(false, Ordering::SeqCst);
            });
        self.link.connect(Some(Arc::new(handlers)));
    }

    fn spawn_watcher(&self) -> JoinHandle<()> {
        let connected = Arc::clone(&self.connected);
        let mut events = self.link.events();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(LinkEvent::Opened) => connected.store(true, Ordering::SeqCst),
                    Ok(LinkEvent::Closed) => connected.store(false, Ordering::SeqCst),
                    Ok(LinkEvent::GaveUp) => {
                        tracing::warn!("Printer link gave up reconnecting");
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Printer link events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn lock_watcher(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.watcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Close the link without reconnecting
    pub fn disconnect(&self) {
        self.link.disconnect();
        if let Some(watcher) = self.lock_watcher().take() {
            watcher.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    pub async fn send_gcode(&self, script: &str) -> ClientResult<Value> {
        self.printer.send_gcode(script).await
    }

    pub async fn temperature_limits(&self) -> ClientResult<TemperatureLimits> {
        self.printer.temperature_limits().await
    }

    /// Heat to a material preset, clamped into the printer's limits
    pub async fn apply_preset(&self, preset: &TemperaturePreset) -> ClientResult<Temperature> {
        let limits = self.printer.temperature_limits().await?;
        let target = adjusted_preset_temperature(preset, &limits);
        let script = GcodeBuilder::new()
            .hotend_temperature(target.hotend)
            .bed_temperature(target.bed)
            .build();
        self.printer.send_gcode(&script).await?;
        Ok(target)
    }
}

impl Drop for PrinterStore {
    fn drop(&mut self) {
        if let Some(watcher) = self.lock_watcher().take() {
            watcher.abort();
        }
    }
}
