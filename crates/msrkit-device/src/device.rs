use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use msrkit_codec::{decode_raw, encode_raw, DecodedTrack, TrackFormat};
use msrkit_frame::command::code;
use msrkit_frame::{
    build_command, command_name, decode_iso_response, decode_track_response, encode_track_block,
    extract_status, FrameError, Packet, PacketAssembler, PacketWriter, Status, StatusReply,
    TrackSet, ESC,
};
use msrkit_transport::{Report, Transport, REPORT_SIZE};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DeviceConfig;
use crate::error::{DeviceError, Result};
use crate::led::LedMode;
use crate::settings::{Coercivity, Density, TrackSelection};

type PendingRead = JoinHandle<msrkit_transport::Result<Report>>;

/// Which deadline a command's response is held to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    /// Answered immediately.
    Check,
    /// Answered after a card swipe.
    Swipe,
}

/// A command session with one device.
///
/// Methods take `&mut self`: one command is in flight at a time. Share a
/// session across tasks by wrapping it in a mutex; use a [`ResetHandle`] to
/// abort a swipe wait from elsewhere.
pub struct Device<T: Transport> {
    transport: Arc<T>,
    config: DeviceConfig,
    assembler: PacketAssembler,
    /// A packet read that outlived its deadline. The next send discards
    /// the late reply it returns before the new command goes out.
    pending_read: Option<PendingRead>,
}

impl<T: Transport> Device<T> {
    /// Start a session with default timing.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, DeviceConfig::default())
    }

    /// Start a session with explicit timing.
    pub fn with_config(transport: T, config: DeviceConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config,
            assembler: PacketAssembler::new(),
            pending_read: None,
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DeviceConfig) {
        self.config = config;
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// A handle that can reset the device while a command is waiting.
    pub fn reset_handle(&self) -> ResetHandle<T> {
        ResetHandle {
            transport: Arc::clone(&self.transport),
        }
    }

    /// Reset the device, cancelling any operation in progress.
    pub async fn reset(&mut self) -> Result<()> {
        self.send(build_command(code::RESET, &[])).await
    }

    /// Select write coercivity.
    pub async fn set_coercivity(&mut self, coercivity: Coercivity) -> Result<()> {
        let op = match coercivity {
            Coercivity::Low => code::SET_LO_CO,
            Coercivity::High => code::SET_HI_CO,
        };
        self.send_and_check(op, &[], Wait::Check).await.map(drop)
    }

    /// Query the current write coercivity.
    pub async fn coercivity(&mut self) -> Result<Coercivity> {
        let reply = self
            .send_and_receive(code::GET_COERCIVITY, &[], Wait::Check)
            .await?;
        match reply.get(1).map(u8::to_ascii_lowercase) {
            Some(b'h') => Ok(Coercivity::High),
            Some(b'l') => Ok(Coercivity::Low),
            Some(byte) => match Status::from_byte(byte) {
                Status::Ok | Status::Unknown(_) => Err(unexpected("coercivity", &reply)),
                status => Err(FrameError::Status(status).into()),
            },
            None => Err(unexpected("coercivity", &reply)),
        }
    }

    /// Set recording density per track, in bits per inch (0 leaves a
    /// track unchanged, otherwise 75 or 210).
    pub async fn set_bits_per_inch(&mut self, track1: u16, track2: u16, track3: u16) -> Result<()> {
        let densities = [
            Density::from_bpi(track1)?,
            Density::from_bpi(track2)?,
            Density::from_bpi(track3)?,
        ];
        let params: Vec<u8> = densities
            .iter()
            .enumerate()
            .filter_map(|(index, density)| density.param(index))
            .collect();
        self.send_and_check(code::SET_BPI, &params, Wait::Check)
            .await
            .map(drop)
    }

    /// Set bits per character (parity included) per track.
    pub async fn set_bits_per_char(&mut self, track1: u8, track2: u8, track3: u8) -> Result<()> {
        let bits = [track1, track2, track3];
        if let Some(bad) = bits
            .iter()
            .find(|b| !(TrackFormat::MIN_BITS..=TrackFormat::MAX_BITS).contains(*b))
        {
            return Err(DeviceError::InvalidParameter(format!(
                "bits per character must be {}..={}, got {bad}",
                TrackFormat::MIN_BITS,
                TrackFormat::MAX_BITS
            )));
        }

        let reply = self.send_and_check(code::SET_BPC, &bits, Wait::Check).await?;
        debug!(echo = ?reply.result.as_ref(), "bits per char acknowledged");
        Ok(())
    }

    /// Erase the selected tracks of the next swiped card.
    pub async fn erase(&mut self, tracks: TrackSelection) -> Result<()> {
        if tracks.is_empty() {
            return Err(DeviceError::InvalidParameter(
                "erase needs at least one track".to_string(),
            ));
        }
        self.send_and_check(code::ERASE, &[tracks.mask()], Wait::Swipe)
            .await
            .map(drop)
    }

    /// Write raw bitstreams to the next swiped card. Empty tracks are left
    /// out of the block.
    pub async fn write_raw_tracks(&mut self, tracks: [&[u8]; 3]) -> Result<()> {
        let block = encode_track_block(tracks)?;
        self.send_and_check(code::WRITE_RAW, &block, Wait::Swipe)
            .await
            .map(drop)
    }

    /// Read raw bitstreams from the next swiped card.
    pub async fn read_raw_tracks(&mut self) -> Result<TrackSet> {
        let reply = self
            .send_and_receive(code::READ_RAW, &[], Wait::Swipe)
            .await?;
        Ok(decode_track_response(&reply)?)
    }

    /// Encode track text with per-track formats and write it raw.
    ///
    /// Every track is encoded before anything is sent, so an unencodable
    /// character fails without touching the device.
    pub async fn write_track_text(
        &mut self,
        texts: [&[u8]; 3],
        formats: &[TrackFormat; 3],
    ) -> Result<()> {
        let mut raw: [Vec<u8>; 3] = Default::default();
        for (index, text) in texts.iter().enumerate() {
            if !text.is_empty() {
                raw[index] = encode_raw(text, &formats[index])?;
            }
        }
        self.write_raw_tracks([raw[0].as_slice(), raw[1].as_slice(), raw[2].as_slice()])
            .await
    }

    /// Read raw tracks and decode them with per-track formats.
    pub async fn read_track_text(&mut self, formats: &[TrackFormat; 3]) -> Result<[DecodedTrack; 3]> {
        let [t1, t2, t3] = self.read_raw_tracks().await?;
        Ok([
            decode_raw(&t1, &formats[0]),
            decode_raw(&t2, &formats[1]),
            decode_raw(&t3, &formats[2]),
        ])
    }

    /// Write ISO-formatted text to the next swiped card.
    pub async fn write_iso_tracks(&mut self, tracks: [&[u8]; 3]) -> Result<()> {
        let block = encode_track_block(tracks)?;
        self.send_and_check(code::WRITE_ISO, &block, Wait::Swipe)
            .await
            .map(drop)
    }

    /// Read ISO-formatted text from the next swiped card.
    pub async fn read_iso_tracks(&mut self) -> Result<TrackSet> {
        let reply = self
            .send_and_receive(code::READ_ISO, &[], Wait::Swipe)
            .await?;
        Ok(decode_iso_response(&reply)?)
    }

    /// The device's model string.
    pub async fn model(&mut self) -> Result<String> {
        let reply = self.send_and_receive(code::MODEL, &[], Wait::Check).await?;
        let body = strip_esc(&reply);
        let body = body.strip_suffix(b"S").unwrap_or(body);
        Ok(String::from_utf8_lossy(body).into_owned())
    }

    /// The device's firmware version string.
    pub async fn firmware_version(&mut self) -> Result<String> {
        let reply = self
            .send_and_receive(code::FIRMWARE, &[], Wait::Check)
            .await?;
        Ok(String::from_utf8_lossy(strip_esc(&reply)).into_owned())
    }

    /// Switch the LEDs. The device does not answer.
    pub async fn set_led(&mut self, mode: LedMode) -> Result<()> {
        self.send(build_command(mode.op(), &[])).await
    }

    /// Check that the device answers on the link.
    pub async fn test_communication(&mut self) -> Result<()> {
        let reply = self
            .send_and_receive(code::TEST_COMMUNICATION, &[], Wait::Check)
            .await?;
        if reply.starts_with(&[ESC, b'y']) {
            Ok(())
        } else {
            Err(unexpected("communication test", &reply))
        }
    }

    /// Check the card sensor. Waits for a swipe.
    pub async fn test_sensor(&mut self) -> Result<()> {
        self.send_and_check(code::TEST_SENSOR, &[], Wait::Swipe)
            .await
            .map(drop)
    }

    /// Check the device's RAM.
    pub async fn test_ram(&mut self) -> Result<()> {
        self.send_and_check(code::TEST_RAM, &[], Wait::Check)
            .await
            .map(drop)
    }

    /// Reset the device and release the transport.
    ///
    /// The transport is closed even when the reset fails; the reset error
    /// is reported first.
    pub async fn close(mut self) -> Result<()> {
        let reset = self.reset().await;
        if self.pending_read.take().is_some() {
            debug!("abandoning parked packet read");
        }

        let transport = Arc::clone(&self.transport);
        let closed = tokio::task::spawn_blocking(move || transport.close()).await?;
        info!("device session closed");

        reset?;
        Ok(closed?)
    }

    async fn send_and_check(&mut self, op: u8, params: &[u8], wait: Wait) -> Result<StatusReply> {
        let reply = self.send_and_receive(op, params, wait).await?;
        Ok(extract_status(&reply)?)
    }

    async fn send_and_receive(&mut self, op: u8, params: &[u8], wait: Wait) -> Result<Bytes> {
        debug!(command = command_name(op), ?wait, "command");
        self.send(build_command(op, params)).await?;
        self.receive(wait).await
    }

    async fn send(&mut self, message: Bytes) -> Result<()> {
        self.discard_late_reply().await?;
        if !self.config.pre_send_delay.is_zero() {
            tokio::time::sleep(self.config.pre_send_delay).await;
        }
        send_message(&self.transport, message).await
    }

    async fn receive(&mut self, wait: Wait) -> Result<Bytes> {
        let timeout = match wait {
            Wait::Check => self.config.check_timeout,
            Wait::Swipe => self.config.swipe_timeout,
        };

        self.assembler.clear();
        loop {
            let report = self.read_packet(timeout).await?;
            if let Some(message) = self.assembler.push(&Packet::from_report(report))? {
                debug!(len = message.len(), "response received");
                return Ok(message);
            }
        }
    }

    /// Drop the reply to a command that already timed out.
    ///
    /// The parked read gets one check timeout to produce the late reply.
    /// Its packets are discarded up to the end flag. If nothing arrives the
    /// read stays parked and serves the next command's reply.
    async fn discard_late_reply(&mut self) -> Result<()> {
        let Some(mut read) = self.pending_read.take() else {
            return Ok(());
        };

        let window = self.config.check_timeout;
        loop {
            match tokio::time::timeout(window, &mut read).await {
                Ok(joined) => {
                    let packet = Packet::from_report(joined??);
                    warn!(
                        len = packet.len(),
                        end = packet.is_end(),
                        "discarding late packet"
                    );
                    if packet.is_end() {
                        return Ok(());
                    }
                    read = self.spawn_read();
                }
                Err(_) => {
                    debug!("no late reply; keeping parked read");
                    self.pending_read = Some(read);
                    return Ok(());
                }
            }
        }
    }

    fn spawn_read(&self) -> PendingRead {
        let transport = Arc::clone(&self.transport);
        tokio::task::spawn_blocking(move || {
            let mut report = [0u8; REPORT_SIZE];
            transport.read(&mut report).map(|()| report)
        })
    }

    /// Read one packet, giving up after `timeout`. A read that misses the
    /// deadline keeps running and is parked; the next command discards
    /// whatever it returns.
    async fn read_packet(&mut self, timeout: Duration) -> Result<Report> {
        let mut read = match self.pending_read.take() {
            Some(parked) => {
                debug!("resuming parked packet read");
                parked
            }
            None => self.spawn_read(),
        };

        match tokio::time::timeout(timeout, &mut read).await {
            Ok(joined) => Ok(joined??),
            Err(_) => {
                warn!(?timeout, "no packet before deadline");
                self.pending_read = Some(read);
                Err(DeviceError::Timeout(timeout))
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for Device<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("config", &self.config)
            .field("pending_read", &self.pending_read.is_some())
            .finish()
    }
}

/// Sends a Reset to the device independently of the session.
pub struct ResetHandle<T> {
    transport: Arc<T>,
}

impl<T: Transport> ResetHandle<T> {
    /// Write a Reset command now, without the pre-send delay.
    pub async fn reset(&self) -> Result<()> {
        debug!("out-of-band reset");
        send_message(&self.transport, build_command(code::RESET, &[])).await
    }
}

impl<T> Clone for ResetHandle<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

async fn send_message<T: Transport>(transport: &Arc<T>, message: Bytes) -> Result<()> {
    let transport = Arc::clone(transport);
    tokio::task::spawn_blocking(move || PacketWriter::new(transport).send(&message)).await??;
    Ok(())
}

fn strip_esc(reply: &[u8]) -> &[u8] {
    reply.strip_prefix(&[ESC]).unwrap_or(reply)
}

fn unexpected(what: &str, reply: &[u8]) -> DeviceError {
    DeviceError::UnexpectedResponse(format!("{what} reply {reply:02X?}"))
}

#[cfg(test)]
mod tests {
    use std::io;

    use msrkit_codec::Preset;
    use msrkit_frame::segment;
    use msrkit_transport::{MockTransport, TransportError};

    use super::*;

    fn fast_config() -> DeviceConfig {
        DeviceConfig {
            pre_send_delay: Duration::ZERO,
            check_timeout: Duration::from_millis(100),
            swipe_timeout: Duration::from_millis(200),
        }
    }

    fn session() -> (Arc<MockTransport>, Device<Arc<MockTransport>>) {
        let mock = Arc::new(MockTransport::with_stall_limit(Duration::from_secs(1)));
        let device = Device::with_config(Arc::clone(&mock), fast_config());
        (mock, device)
    }

    fn respond(mock: &MockTransport, message: &[u8]) {
        mock.push_reports(segment(message).iter().map(|p| *p.as_bytes()));
    }

    fn sent(mock: &MockTransport) -> Vec<Vec<u8>> {
        mock.written()
            .iter()
            .map(|report| report[1..=usize::from(report[0] & 0x3F)].to_vec())
            .collect()
    }

    #[tokio::test]
    async fn reset_is_send_only() {
        let (mock, mut device) = session();
        device.reset().await.unwrap();
        assert_eq!(mock.written()[0][..3], [0xC2, 0x1B, b'a']);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn set_coercivity_commands() {
        let (mock, mut device) = session();
        respond(&mock, &[ESC, b'0']);
        respond(&mock, &[ESC, b'0']);
        device.set_coercivity(Coercivity::Low).await.unwrap();
        device.set_coercivity(Coercivity::High).await.unwrap();
        assert_eq!(sent(&mock), vec![vec![ESC, b'x'], vec![ESC, b'y']]);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn coercivity_query() {
        let (mock, mut device) = session();
        respond(&mock, &[ESC, b'H']);
        assert_eq!(device.coercivity().await.unwrap(), Coercivity::High);
        respond(&mock, &[ESC, b'l']);
        assert_eq!(device.coercivity().await.unwrap(), Coercivity::Low);
        respond(&mock, &[ESC, b'q']);
        assert!(matches!(
            device.coercivity().await,
            Err(DeviceError::UnexpectedResponse(_))
        ));
        assert_eq!(sent(&mock)[0], vec![ESC, b'd']);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn bits_per_inch_params() {
        let (mock, mut device) = session();
        respond(&mock, &[ESC, b'0']);
        device.set_bits_per_inch(210, 75, 0).await.unwrap();
        assert_eq!(mock.written()[0][..5], [0xC4, ESC, b'b', 0xD2, 0xA0]);

        respond(&mock, &[ESC, b'0']);
        device.set_bits_per_inch(75, 0, 210).await.unwrap();
        assert_eq!(sent(&mock)[1], vec![ESC, b'b', 0x4B, 0xC1]);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn invalid_density_rejected_before_io() {
        let (mock, mut device) = session();
        let err = device.set_bits_per_inch(210, 100, 0).await.unwrap_err();
        assert!(matches!(err, DeviceError::InvalidParameter(_)));
        assert!(mock.written().is_empty());
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn bits_per_char_with_echo() {
        let (mock, mut device) = session();
        respond(&mock, &[ESC, b'0', 7, 5, 5]);
        device.set_bits_per_char(7, 5, 5).await.unwrap();
        assert_eq!(sent(&mock)[0], vec![ESC, b'o', 7, 5, 5]);

        let err = device.set_bits_per_char(7, 3, 5).await.unwrap_err();
        assert!(matches!(err, DeviceError::InvalidParameter(_)));
        assert_eq!(mock.written().len(), 1);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn erase_mask() {
        let (mock, mut device) = session();
        respond(&mock, &[ESC, b'0']);
        device
            .erase(TrackSelection::new(true, false, true))
            .await
            .unwrap();
        assert_eq!(sent(&mock)[0], vec![ESC, b'c', 0b101]);

        let err = device.erase(TrackSelection::NONE).await.unwrap_err();
        assert!(matches!(err, DeviceError::InvalidParameter(_)));
        assert_eq!(mock.written().len(), 1);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn write_raw_sends_track_block() {
        let (mock, mut device) = session();
        respond(&mock, &[ESC, b'0']);
        device
            .write_raw_tracks([b"AB", b"", b"123"])
            .await
            .unwrap();

        let mut expected = vec![ESC, b'n'];
        expected.extend_from_slice(&encode_track_block([b"AB", b"", b"123"]).unwrap());
        assert_eq!(sent(&mock)[0], expected);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn write_failure_status_reported() {
        let (mock, mut device) = session();
        respond(&mock, &[ESC, b'9']);
        let err = device.write_raw_tracks([b"A", b"", b""]).await.unwrap_err();
        assert_eq!(err.status(), Some(Status::WriteSwipe));
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn read_raw_multi_packet_response() {
        let (mock, mut device) = session();
        let long = vec![0x5Au8; 150];
        let mut response = encode_track_block([&long, b"", b"\x1b0"]).unwrap().to_vec();
        response.extend_from_slice(&[ESC, b'0']);
        respond(&mock, &response);

        let tracks = device.read_raw_tracks().await.unwrap();
        assert_eq!(tracks[0], long);
        assert!(tracks[1].is_empty());
        assert_eq!(tracks[2], b"\x1b0");
        assert_eq!(sent(&mock)[0], vec![ESC, b'm']);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn track_text_round_trip() {
        let (mock, mut device) = session();
        let formats = Preset::Iso.formats().unwrap();
        respond(&mock, &[ESC, b'0']);
        device
            .write_track_text([b"%B123^X^25?", b";123=25?", b""], &formats)
            .await
            .unwrap();

        // Echo the written block back as a raw read response.
        let written = sent(&mock).remove(0);
        let mut response = written[2..].to_vec();
        response.extend_from_slice(&[ESC, b'0']);
        respond(&mock, &response);

        let [t1, t2, t3] = device.read_track_text(&formats).await.unwrap();
        assert_eq!(t1.text(), "%B123^X^25?");
        assert_eq!(t2.text(), ";123=25?");
        assert!(t1.is_valid() && t2.is_valid());
        assert!(t3.chars.is_empty());
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn unencodable_text_rejected_before_io() {
        let (mock, mut device) = session();
        let formats = Preset::Iso.formats().unwrap();
        let err = device
            .write_track_text([b"", b";12A?", b""], &formats)
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::Codec(_)));
        assert!(mock.written().is_empty());
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn iso_read_and_write() {
        let (mock, mut device) = session();
        respond(&mock, &[ESC, b'0']);
        device
            .write_iso_tracks([b"%B1^A^2?", b"", b""])
            .await
            .unwrap();
        assert_eq!(sent(&mock)[0][..4], [ESC, b'w', ESC, b's']);

        let mut response = vec![ESC, b's', ESC, 1];
        response.extend_from_slice(b"%B1^A^2?");
        response.extend_from_slice(&[ESC, 2, ESC, 3, b'?', 0x1C, ESC, b'0']);
        respond(&mock, &response);
        let tracks = device.read_iso_tracks().await.unwrap();
        assert_eq!(tracks[0], b"%B1^A^2?");
        assert!(tracks[1].is_empty() && tracks[2].is_empty());
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn model_and_firmware() {
        let (mock, mut device) = session();
        respond(&mock, &[ESC, b'3', b'S']);
        respond(&mock, b"\x1bREVU2.31");
        assert_eq!(device.model().await.unwrap(), "3");
        assert_eq!(device.firmware_version().await.unwrap(), "REVU2.31");
        assert_eq!(sent(&mock), vec![vec![ESC, b't'], vec![ESC, b'v']]);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn led_is_send_only() {
        let (mock, mut device) = session();
        device.set_led(LedMode::GreenOn).await.unwrap();
        device
            .set_led(LedMode::try_from(0x85).unwrap())
            .await
            .unwrap();
        assert_eq!(sent(&mock), vec![vec![ESC, 0x83], vec![ESC, 0x85]]);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn self_tests() {
        let (mock, mut device) = session();
        respond(&mock, &[ESC, b'y']);
        respond(&mock, &[ESC, b'0']);
        respond(&mock, &[ESC, b'A']);
        device.test_communication().await.unwrap();
        device.test_sensor().await.unwrap();
        let err = device.test_ram().await.unwrap_err();
        assert_eq!(err.status(), Some(Status::Fail));
        assert_eq!(
            sent(&mock),
            vec![vec![ESC, b'e'], vec![ESC, 0x86], vec![ESC, 0x87]]
        );

        respond(&mock, &[ESC, b'0']);
        assert!(matches!(
            device.test_communication().await,
            Err(DeviceError::UnexpectedResponse(_))
        ));
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn missing_response_times_out() {
        let (mock, mut device) = session();
        let err = device.test_ram().await.unwrap_err();
        assert!(matches!(err, DeviceError::Timeout(d) if d == Duration::from_millis(100)));
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn swipe_commands_use_swipe_timeout() {
        let (mock, mut device) = session();
        let err = device.test_sensor().await.unwrap_err();
        assert!(matches!(err, DeviceError::Timeout(d) if d == Duration::from_millis(200)));
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn late_ack_is_discarded_before_next_command() {
        let (mock, mut device) = session();
        assert!(device
            .set_coercivity(Coercivity::High)
            .await
            .unwrap_err()
            .is_timeout());

        // Ack to the timed-out command, then the replies to what follows.
        respond(&mock, &[ESC, b'0']);
        device.reset().await.unwrap();
        respond(&mock, &[ESC, b'h']);
        assert_eq!(device.coercivity().await.unwrap(), Coercivity::High);
        respond(&mock, &[ESC, b'3', b'S']);
        assert_eq!(device.model().await.unwrap(), "3");

        assert_eq!(mock.pending_reads(), 0);
        assert_eq!(
            sent(&mock),
            vec![vec![ESC, b'y'], vec![ESC, b'a'], vec![ESC, b'd'], vec![ESC, b't']]
        );
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn late_multi_packet_reply_is_discarded_whole() {
        let (mock, mut device) = session();
        assert!(device.read_raw_tracks().await.unwrap_err().is_timeout());

        let long = vec![0x5Au8; 100];
        let mut late = encode_track_block([&long, b"", b""]).unwrap().to_vec();
        late.extend_from_slice(&[ESC, b'0']);
        respond(&mock, &late);
        respond(&mock, b"\x1bREVU2.31");

        assert_eq!(device.firmware_version().await.unwrap(), "REVU2.31");
        assert_eq!(mock.pending_reads(), 0);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn parked_read_serves_next_reply_when_nothing_late_arrives() {
        let (mock, mut device) = session();
        assert!(device.test_ram().await.unwrap_err().is_timeout());

        // The parked read waits out the discard window, then catches the
        // reply to the next command.
        let (reply, ()) = tokio::join!(device.coercivity(), async {
            tokio::time::sleep(Duration::from_millis(150)).await;
            respond(&mock, &[ESC, b'l']);
        });
        assert_eq!(reply.unwrap(), Coercivity::Low);
        assert_eq!(sent(&mock), vec![vec![ESC, 0x87], vec![ESC, b'd']]);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn reset_handle_writes_during_swipe_wait() {
        let (mock, mut device) = session();
        let handle = device.reset_handle();

        let (sensor, reset) = tokio::join!(device.test_sensor(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.reset().await
        });
        reset.unwrap();
        assert!(sensor.unwrap_err().is_timeout());
        assert_eq!(sent(&mock), vec![vec![ESC, 0x86], vec![ESC, b'a']]);
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn write_failure_aborts_command() {
        let (mock, mut device) = session();
        mock.fail_writes_after(0);
        let err = device.test_ram().await.unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Transport(TransportError::Io(ref e)) if e.kind() == io::ErrorKind::BrokenPipe
        ));
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn read_failure_propagates() {
        let (mock, mut device) = session();
        mock.push_read_error(io::ErrorKind::ConnectionReset);
        let err = device.test_ram().await.unwrap_err();
        assert!(matches!(err, DeviceError::Transport(TransportError::Io(_))));
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn desynced_packet_is_framing_error() {
        let (mock, mut device) = session();
        let mut report = [0u8; REPORT_SIZE];
        report[0] = 0x40 | 2;
        report[1] = ESC;
        report[2] = b'0';
        mock.push_report(report);
        let err = device.test_ram().await.unwrap_err();
        assert!(matches!(err, DeviceError::Frame(FrameError::MissingStart)));
        mock.close().unwrap();
    }

    #[tokio::test]
    async fn close_resets_then_releases() {
        let (mock, device) = session();
        device.close().await.unwrap();
        assert_eq!(sent(&mock), vec![vec![ESC, b'a']]);
        assert!(mock.is_closed());
    }
}
