use std::io::Write;

/// Short audible cue played after a notification is shown. Best effort.
pub trait AudioCue: Send + Sync {
    fn play_tone(&self) -> anyhow::Result<()>;
}

pub struct NoSound;

impl AudioCue for NoSound {
    fn play_tone(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Rings the terminal bell.
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play_tone(&self) -> anyhow::Result<()> {
        let mut stderr = std::io::stderr();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        Ok(())
    }
}

/// 880 Hz sine for half a second at half volume on the default output device.
#[cfg(feature = "sound")]
pub struct SineTone;

#[cfg(feature = "sound")]
impl SineTone {
    const FREQUENCY_HZ: f32 = 880.0;
    const DURATION: std::time::Duration = std::time::Duration::from_millis(500);
    const VOLUME: f32 = 0.5;

    fn play_blocking() -> anyhow::Result<()> {
        use rodio::Source;

        let (_stream, handle) = rodio::OutputStream::try_default()?;
        let sink = rodio::Sink::try_new(&handle)?;
        let tone = rodio::source::SineWave::new(Self::FREQUENCY_HZ)
            .take_duration(Self::DURATION)
            .amplify(Self::VOLUME);

        sink.append(tone);
        sink.sleep_until_end();
        Ok(())
    }
}

#[cfg(feature = "sound")]
impl AudioCue for SineTone {
    fn play_tone(&self) -> anyhow::Result<()> {
        // The output stream is not Send, so it lives and dies on its own thread.
        std::thread::Builder::new()
            .name("chime-tone".to_string())
            .spawn(|| {
                if let Err(e) = Self::play_blocking() {
                    log::warn!("Failed to play notification tone: {e}");
                }
            })?;
        Ok(())
    }
}
