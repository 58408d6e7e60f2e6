use clap::{Args, Subcommand, ValueEnum};
use msrkit_codec::{Parity, Preset, TrackFormat, TrailingTrim};
use msrkit_device::{parse_duration, Coercivity, DeviceConfig, LedMode};

use crate::exit::{codec_error, device_error, CliResult};
use crate::output::OutputFormat;

pub mod coercivity;
pub mod density;
pub mod encode;
pub mod erase;
pub mod info;
pub mod led;
pub mod pan;
pub mod read;
pub mod reset;
pub mod selftest;
pub mod session;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show model, firmware version and coercivity.
    Info(DeviceArgs),
    /// Reset the device, cancelling any pending operation.
    Reset(DeviceArgs),
    /// Query or set write coercivity.
    Coercivity(CoercivityArgs),
    /// Set recording density per track.
    Bpi(BpiArgs),
    /// Set bits per character per track.
    Bpc(BpcArgs),
    /// Switch the front-panel LEDs.
    Led(LedArgs),
    /// Erase tracks on the next swiped card.
    Erase(EraseArgs),
    /// Run a device self-test.
    Selftest(SelftestArgs),
    /// Read the next swiped card.
    Read(ReadArgs),
    /// Write the next swiped card.
    Write(WriteArgs),
    /// Encode track text to raw bytes (offline).
    Encode(EncodeArgs),
    /// Decode raw track bytes to text (offline).
    Decode(DecodeArgs),
    /// Check a primary account number (offline).
    Pan(PanArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Info(args) => info::run(args, format),
        Command::Reset(args) => reset::run(args, format),
        Command::Coercivity(args) => coercivity::run(args, format),
        Command::Bpi(args) => density::run_bpi(args, format),
        Command::Bpc(args) => density::run_bpc(args, format),
        Command::Led(args) => led::run(args, format),
        Command::Erase(args) => erase::run(args, format),
        Command::Selftest(args) => selftest::run(args, format),
        Command::Read(args) => read::run(args, format),
        Command::Write(args) => write::run(args, format),
        Command::Encode(args) => encode::run_encode(args, format),
        Command::Decode(args) => encode::run_decode(args, format),
        Command::Pan(args) => pan::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Session timing, settable from the environment.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Pause before each command (e.g. 10ms).
    #[arg(long, env = "MSRKIT_PRE_SEND_DELAY", default_value = "10ms")]
    pub pre_send_delay: String,
    /// Deadline for immediate replies (e.g. 150ms).
    #[arg(long, env = "MSRKIT_CHECK_TIMEOUT", default_value = "150ms")]
    pub check_timeout: String,
    /// Deadline for replies that wait for a swipe (e.g. 30s).
    #[arg(long, env = "MSRKIT_SWIPE_TIMEOUT", default_value = "30s")]
    pub swipe_timeout: String,
}

impl DeviceArgs {
    pub fn config(&self) -> CliResult<DeviceConfig> {
        let parse = |value: &str| parse_duration(value).map_err(|e| device_error("config", e));
        let config = DeviceConfig {
            pre_send_delay: parse(&self.pre_send_delay)?,
            check_timeout: parse(&self.check_timeout)?,
            swipe_timeout: parse(&self.swipe_timeout)?,
        };
        config.validate().map_err(|e| device_error("config", e))?;
        Ok(config)
    }
}

/// Track layout selection shared by read, write, encode and decode.
#[derive(Args, Debug, Clone)]
pub struct FormatArgs {
    /// Track layout preset.
    #[arg(long, value_enum, default_value = "iso")]
    pub preset: PresetArg,
    /// Parity scheme.
    #[arg(long, value_enum, default_value = "odd")]
    pub parity: ParityArg,
    /// Keep the last non-zero character (normally the LRC) when decoding.
    #[arg(long)]
    pub keep_lrc: bool,
}

impl FormatArgs {
    pub fn formats(&self) -> CliResult<[TrackFormat; 3]> {
        let formats = Preset::from(self.preset)
            .formats()
            .map_err(|e| codec_error("format", e))?;
        Ok(formats.map(|f| self.apply(f)))
    }

    pub fn format(&self, track: u8) -> CliResult<TrackFormat> {
        let format = Preset::from(self.preset)
            .format(track)
            .map_err(|e| codec_error("format", e))?;
        Ok(self.apply(format))
    }

    fn apply(&self, format: TrackFormat) -> TrackFormat {
        let trim = if self.keep_lrc {
            TrailingTrim::ThroughLastNonNull
        } else {
            TrailingTrim::ExcludeLastNonNull
        };
        format.with_parity(self.parity.into()).with_trim(trim)
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum PresetArg {
    Iso,
    Aamva,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Iso => Preset::Iso,
            PresetArg::Aamva => Preset::Aamva,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ParityArg {
    Odd,
    Even,
}

impl From<ParityArg> for Parity {
    fn from(arg: ParityArg) -> Self {
        match arg {
            ParityArg::Odd => Parity::Odd,
            ParityArg::Even => Parity::Even,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum CoercivityArg {
    Lo,
    Hi,
}

impl From<CoercivityArg> for Coercivity {
    fn from(arg: CoercivityArg) -> Self {
        match arg {
            CoercivityArg::Lo => Coercivity::Low,
            CoercivityArg::Hi => Coercivity::High,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LedArg {
    Off,
    On,
    Green,
    Yellow,
    Red,
}

impl From<LedArg> for LedMode {
    fn from(arg: LedArg) -> Self {
        match arg {
            LedArg::Off => LedMode::AllOff,
            LedArg::On => LedMode::AllOn,
            LedArg::Green => LedMode::GreenOn,
            LedArg::Yellow => LedMode::YellowOn,
            LedArg::Red => LedMode::RedOn,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum SelftestKind {
    Communication,
    Sensor,
    Ram,
}

#[derive(Args, Debug)]
pub struct CoercivityArgs {
    /// Set this coercivity; omit to query.
    #[arg(value_enum)]
    pub set: Option<CoercivityArg>,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct BpiArgs {
    /// Track 1 density: 0 (leave), 75 or 210.
    pub track1: u16,
    /// Track 2 density: 0 (leave), 75 or 210.
    pub track2: u16,
    /// Track 3 density: 0 (leave), 75 or 210.
    pub track3: u16,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct BpcArgs {
    /// Track 1 bits per character, parity included.
    pub track1: u8,
    /// Track 2 bits per character, parity included.
    pub track2: u8,
    /// Track 3 bits per character, parity included.
    pub track3: u8,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct LedArgs {
    #[arg(value_enum)]
    pub mode: LedArg,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct EraseArgs {
    /// Tracks to erase (comma-separated).
    #[arg(long, value_delimiter = ',', default_value = "1,2,3")]
    pub tracks: Vec<u8>,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct SelftestArgs {
    #[arg(value_enum)]
    pub kind: SelftestKind,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Use the device's ISO read instead of raw read plus local decoding.
    #[arg(long)]
    pub iso: bool,
    /// Include raw track bytes (hex) in the output.
    #[arg(long, conflicts_with = "iso")]
    pub show_raw: bool,
    #[command(flatten)]
    pub layout: FormatArgs,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Track 1 text.
    #[arg(long)]
    pub track1: Option<String>,
    /// Track 2 text.
    #[arg(long)]
    pub track2: Option<String>,
    /// Track 3 text.
    #[arg(long)]
    pub track3: Option<String>,
    /// Use the device's ISO write instead of local encoding plus raw write.
    #[arg(long)]
    pub iso: bool,
    /// Fold lower case and drop characters the track cannot encode.
    #[arg(long, conflicts_with = "iso")]
    pub sanitize: bool,
    /// Skip setting density and bits per character from the preset.
    #[arg(long, conflicts_with = "iso")]
    pub no_configure: bool,
    #[command(flatten)]
    pub layout: FormatArgs,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Track number (1..=3) selecting the preset layout.
    #[arg(long, short = 't', default_value = "2")]
    pub track: u8,
    /// Fold lower case and drop characters the track cannot encode.
    #[arg(long)]
    pub sanitize: bool,
    #[command(flatten)]
    pub layout: FormatArgs,
    /// Track text.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Track number (1..=3) selecting the preset layout.
    #[arg(long, short = 't', default_value = "2")]
    pub track: u8,
    #[command(flatten)]
    pub layout: FormatArgs,
    /// Raw track bytes as hex.
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct PanArgs {
    /// Account number; `-`, `_` and spaces are ignored.
    pub number: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
