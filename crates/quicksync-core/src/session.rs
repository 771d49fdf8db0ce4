//! Sync session - high-level device operations.
//!
//! Every OBEX operation runs inside its own envelope: switch the handset into
//! OBEX mode, CONNECT to the desktop-sync service, run the operation, escape
//! back to AT mode and reset. Nothing carries over between operations.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::events::{LogLevel, SyncEvent, SyncObserver, SyncPhase, TracingObserver};
use crate::payload::{FolderListing, MemoryStatus, parse_memory_response, split_vcards};
use crate::protocol::at::{AtCommand, AtRequest};
use crate::protocol::constants::*;
use crate::protocol::frame;
use crate::state::TransferOperation;
use crate::transceiver::{Transceiver, WaitPolicy};
use crate::transfer;
use crate::transport::{SerialPortTransport, SerialTransport};

/// Fixed delays, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Poll interval for AT responses.
    pub after_invoke_ms: u64,
    /// Settle time after switching into OBEX mode.
    pub after_enter_obex_ms: u64,
    /// Settle time after leaving OBEX mode, and for the reset that follows.
    pub after_exit_obex_ms: u64,
    /// Pause around the escape sequence.
    pub obex_boundary_ms: u64,
    /// Poll interval for OBEX responses.
    pub obex_poll_ms: u64,
    /// Serial read/write timeout.
    pub io_timeout_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            after_invoke_ms: 100,
            after_enter_obex_ms: 500,
            after_exit_obex_ms: 500,
            obex_boundary_ms: 1000,
            obex_poll_ms: 10,
            io_timeout_ms: 2000,
        }
    }
}

impl Timings {
    /// No delays at all; for driving a mock transport.
    pub fn immediate() -> Self {
        Self {
            after_invoke_ms: 0,
            after_enter_obex_ms: 0,
            after_exit_obex_ms: 0,
            obex_boundary_ms: 0,
            obex_poll_ms: 0,
            io_timeout_ms: 0,
        }
    }

    pub fn after_invoke(&self) -> Duration {
        Duration::from_millis(self.after_invoke_ms)
    }

    pub fn after_enter_obex(&self) -> Duration {
        Duration::from_millis(self.after_enter_obex_ms)
    }

    pub fn after_exit_obex(&self) -> Duration {
        Duration::from_millis(self.after_exit_obex_ms)
    }

    pub fn obex_boundary(&self) -> Duration {
        Duration::from_millis(self.obex_boundary_ms)
    }

    pub fn obex_poll(&self) -> Duration {
        Duration::from_millis(self.obex_poll_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

/// Configuration for a sync session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Serial device path.
    pub device: String,
    /// Baud rate.
    pub baud: u32,
    /// Upload chunk size in bytes.
    pub chunk_size: usize,
    pub timings: Timings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyACM0".to_string(),
            baud: 9600,
            chunk_size: UPLOAD_CHUNK_SIZE,
            timings: Timings::default(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SessionConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// AT queries reported by [`Session::device_info`], in display order.
pub const DEVICE_INFO_QUERIES: &[(&str, AtCommand)] = &[
    ("Manufacturer", AtCommand::GetManufacturer),
    ("Type", AtCommand::GetDeviceType),
    ("Product", AtCommand::GetProductName),
    ("Serial", AtCommand::GetSerialNumber),
    ("Internal Name", AtCommand::GetInternalName),
    ("Battery State", AtCommand::GetBatteryState),
    ("Signal State", AtCommand::GetSignalState),
    ("Firmware", AtCommand::GetFirmwareVersion),
    ("Firmware URL", AtCommand::GetFirmwareUrl),
    ("Melodies", AtCommand::ListMelodies),
    ("Area Codes", AtCommand::GetAreaCodes),
    (
        "Hardware Connection State",
        AtCommand::GetHardwareConnectionState,
    ),
    ("Supported Features", AtCommand::GetSupportedFeatures),
    ("Supported Multimedia", AtCommand::GetSupportedMultimedia),
    ("Screen Size Clip", AtCommand::GetScreenSizeClip),
    ("Screen Size Full", AtCommand::GetScreenSizeFull),
    ("Extended Modes List", AtCommand::GetExtendedModesList),
    ("Current Extended Mode", AtCommand::GetCurrentExtendedMode),
];

/// Objects dumped by [`Session::obex_info`].
pub const OBEX_INFO_OBJECTS: &[&str] = &[PATH_INFO_LOG, PATH_DEV_INFO, PATH_LUID_CC, PATH_LUID_0];

/// Answer to one device-info query. Failures are kept per item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoItem {
    pub title: &'static str,
    pub value: Result<String, String>,
}

/// Storage summary and per-folder listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageReport {
    pub memory: MemoryStatus,
    pub folders: Vec<(String, FolderListing)>,
}

/// Sync session - runs device operations over one transport.
pub struct Session<T: SerialTransport, O: SyncObserver> {
    transport: T,
    observer: Arc<O>,
    config: SessionConfig,
}

impl Session<SerialPortTransport, TracingObserver> {
    /// Open the configured serial port with the default tracing observer.
    pub fn open(config: SessionConfig) -> Result<Self> {
        let transport = SerialPortTransport::open(
            &config.device,
            config.baud,
            config.timings.io_timeout(),
        )
        .with_context(|| format!("Cannot open serial port {}", config.device))?;
        Ok(Self::with_transport(
            transport,
            config,
            Arc::new(TracingObserver),
        ))
    }
}

impl<T: SerialTransport, O: SyncObserver> Session<T, O> {
    /// Create a session over an already opened transport.
    pub fn with_transport(transport: T, config: SessionConfig, observer: Arc<O>) -> Self {
        observer.on_event(&SyncEvent::Connected {
            port: transport.name(),
        });
        Self {
            transport,
            observer,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn transceiver(&self) -> Transceiver<'_, T, O> {
        Transceiver::new(&self.transport, self.observer.as_ref(), &self.config.timings)
    }

    fn phase(&self, from: SyncPhase, to: SyncPhase) {
        self.observer.on_event(&SyncEvent::PhaseChanged { from, to });
    }

    /// Run `op` inside an OBEX envelope.
    ///
    /// On failure the escape sequence is not sent and the handset stays in
    /// OBEX mode.
    fn with_obex<R>(&self, op: impl FnOnce(&Transceiver<'_, T, O>) -> Result<R>) -> Result<R> {
        let xcvr = self.transceiver();
        let timings = &self.config.timings;

        self.phase(SyncPhase::Command, SyncPhase::EnteringObex);
        xcvr.command(
            AtCommand::EnterObex,
            WaitPolicy::Settle(timings.after_enter_obex()),
        )
        .context("Cannot switch to OBEX mode")?;

        self.phase(SyncPhase::EnteringObex, SyncPhase::Connecting);
        let target = frame::target_header(SERVICE_DES_SYNC)?;
        xcvr.obex(frame::connect(&target)?, TransferOperation::Neither)
            .context("OBEX connect failed")?;

        self.phase(SyncPhase::Connecting, SyncPhase::Transfer);
        let result = op(&xcvr)?;

        self.phase(SyncPhase::Transfer, SyncPhase::LeavingObex);
        thread::sleep(timings.obex_boundary());
        xcvr.command(
            AtCommand::ExitObex,
            WaitPolicy::Settle(timings.obex_boundary()),
        )?;
        thread::sleep(timings.after_exit_obex());
        xcvr.command(AtCommand::Reset, WaitPolicy::Settle(timings.after_exit_obex()))
            .context("Reset after OBEX failed")?;

        self.phase(SyncPhase::LeavingObex, SyncPhase::Complete);
        self.observer.on_event(&SyncEvent::Complete);
        Ok(result)
    }

    /// Query the identification and status commands one by one.
    #[instrument(skip(self))]
    pub fn device_info(&self) -> Vec<InfoItem> {
        let xcvr = self.transceiver();
        DEVICE_INFO_QUERIES
            .iter()
            .map(|&(title, command)| {
                let value = xcvr
                    .command(command, WaitPolicy::Poll)
                    .map_err(|e| e.to_string())
                    .and_then(|bytes| {
                        String::from_utf8(bytes)
                            .ok()
                            .filter(|s| s.is_ascii())
                            .ok_or_else(|| "Response is not ASCII".to_string())
                    });
                if let Err(e) = &value {
                    xcvr.emit(SyncEvent::Log {
                        level: LogLevel::Warn,
                        message: format!("{title}: {e}"),
                    });
                }
                InfoItem { title, value }
            })
            .collect()
    }

    /// Fetch the diagnostic logs the phonebook service exposes.
    #[instrument(skip(self))]
    pub fn obex_info(&self) -> Result<Vec<(String, String)>> {
        self.with_obex(|xcvr| {
            OBEX_INFO_OBJECTS
                .iter()
                .map(|&path| -> Result<(String, String)> {
                    let body = transfer::get_object(xcvr, &frame::name_header(path)?)
                        .with_context(|| format!("Cannot read {path}"))?;
                    let text = String::from_utf8(body)
                        .with_context(|| format!("{path} is not UTF-8"))?;
                    Ok((path.to_string(), text))
                })
                .collect()
        })
    }

    /// Start a call. Returns once the handset accepted the command.
    #[instrument(skip(self))]
    pub fn dial(&self, number: &str) -> Result<()> {
        if number.is_empty() {
            bail!("No number to dial");
        }
        let request = AtRequest::with_args(AtCommand::Dial, &[number])?;
        self.transceiver().at(request, WaitPolicy::Poll)?;
        info!(number = %number, "Dialling");
        Ok(())
    }

    /// Download the whole phonebook as vCard text.
    #[instrument(skip(self))]
    pub fn get_contacts(&self) -> Result<String> {
        self.with_obex(|xcvr| {
            let body = transfer::get_object(xcvr, &frame::name_header(PATH_PHONEBOOK)?)?;
            String::from_utf8(body).context("Phonebook is not UTF-8")
        })
    }

    /// Store every card in `vcf` as a new contact. Returns how many were created.
    ///
    /// Stops at the first rejected card; earlier cards stay on the handset.
    #[instrument(skip(self, vcf), fields(len = vcf.len()))]
    pub fn create_contacts(&self, vcf: &str) -> Result<usize> {
        let cards = split_vcards(vcf);
        if cards.is_empty() {
            bail!("No vCard found in input");
        }

        self.with_obex(|xcvr| {
            for (i, card) in cards.iter().enumerate() {
                let headers = object_headers(PATH_NEW_VCARD, card.as_bytes())?;
                transfer::put_object(xcvr, &headers).with_context(|| {
                    format!("Contact #{} rejected after {} created", i + 1, i)
                })?;
                self.observer
                    .on_event(&SyncEvent::ContactCreated { index: i + 1 });
            }
            Ok(cards.len())
        })
    }

    /// Replace the contact stored under `luid`.
    #[instrument(skip(self, vcf), fields(len = vcf.len()))]
    pub fn edit_contact(&self, luid: &str, vcf: &[u8]) -> Result<()> {
        let path = vcard_luid_path(luid);
        self.with_obex(|xcvr| {
            transfer::put_object(xcvr, &object_headers(&path, vcf)?)
                .with_context(|| format!("Cannot update contact {luid}"))
        })
    }

    /// Delete the contact stored under `luid`.
    #[instrument(skip(self))]
    pub fn delete_contact(&self, luid: &str) -> Result<()> {
        self.delete_object(&vcard_luid_path(luid))
    }

    /// Memory status and the content of the browsable folders.
    #[instrument(skip(self))]
    pub fn list_files(&self) -> Result<StorageReport> {
        self.with_obex(|xcvr| {
            let total = transfer::get_object(
                xcvr,
                &frame::app_parameters_header(APP_PARAM_MEMORY_TOTAL)?,
            )
            .context("Cannot read total memory")?;
            let free = transfer::get_object(
                xcvr,
                &frame::app_parameters_header(APP_PARAM_MEMORY_FREE)?,
            )
            .context("Cannot read free memory")?;

            let mut report = StorageReport {
                memory: MemoryStatus {
                    total: parse_memory_response(&total),
                    free: parse_memory_response(&free),
                },
                folders: Vec::with_capacity(BROWSABLE_FOLDERS.len()),
            };

            for &folder in BROWSABLE_FOLDERS {
                debug!(folder = %folder, "Listing folder");
                xcvr.obex(
                    frame::set_path(SETPATH_DONT_CREATE, folder)?,
                    TransferOperation::Neither,
                )
                .with_context(|| format!("Cannot enter {folder}"))?;

                let xml =
                    transfer::get_object(xcvr, &frame::type_header(MIME_FOLDER_LISTING)?)
                        .with_context(|| format!("Cannot list {folder}"))?;
                let listing = FolderListing::from_bytes(xml)
                    .with_context(|| format!("Bad listing for {folder}"))?;
                report.folders.push((folder.to_string(), listing));
            }

            Ok(report)
        })
    }

    /// Download a file by name.
    #[instrument(skip(self))]
    pub fn download(&self, name: &str) -> Result<Vec<u8>> {
        self.with_obex(|xcvr| {
            transfer::get_object(xcvr, &frame::name_header(name)?)
                .with_context(|| format!("Cannot download {name}"))
        })
    }

    /// Upload `data` as `name`. Returns the number of packets sent.
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub fn upload(&self, name: &str, data: &[u8]) -> Result<usize> {
        let chunk_size = self.config.chunk_size;
        self.with_obex(|xcvr| {
            transfer::upload(xcvr, name, data, chunk_size)
                .with_context(|| format!("Cannot upload {name}"))
        })
    }

    /// Delete a file by name.
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str) -> Result<()> {
        self.delete_object(name)
    }

    fn delete_object(&self, path: &str) -> Result<()> {
        self.with_obex(|xcvr| {
            transfer::put_object(xcvr, &frame::name_header(path)?)
                .with_context(|| format!("Cannot delete {path}"))
        })
    }
}

/// NAME + LENGTH + END-OF-BODY for a single-packet PUT.
fn object_headers(path: &str, data: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(data.len()).context("Object too large")?;
    let mut headers = frame::name_header(path)?;
    headers.extend(frame::length_header(len));
    headers.extend(frame::body_header(data, true)?);
    Ok(headers)
}
