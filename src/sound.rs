use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SizedSample, Stream, StreamConfig};

/// A 440 Hz sine on the default output device, audible while the machine's
/// sound timer is running. The stream is built once and toggled with
/// play/pause so the driver loop never blocks on audio.
pub struct Beeper {
    stream: Stream,
    active: bool,
}

impl Beeper {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no audio output device available")?;
        let config = device
            .default_output_config()
            .context("error while querying audio configs")?;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into())?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into())?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into())?,
            format => bail!("unsupported sample format '{format}'"),
        };
        stream.pause().context("failed to pause audio stream")?;

        Ok(Self {
            stream,
            active: false,
        })
    }

    pub fn set_active(&mut self, on: bool) {
        if on == self.active {
            return;
        }
        if on {
            if let Err(err) = self.stream.play() {
                log::warn!("failed to start beep: {err}");
                return;
            }
        } else if let Err(err) = self.stream.pause() {
            log::warn!("failed to stop beep: {err}");
            return;
        }
        self.active = on;
    }
}

fn build_stream<T>(device: &Device, config: &StreamConfig) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let sample_rate = config.sample_rate.0 as f32;
    let channels = config.channels as usize;

    let mut sample_clock = 0f32;
    let mut next_value = move || {
        sample_clock = (sample_clock + 1.0) % sample_rate;
        (sample_clock * 440.0 * 2.0 * std::f32::consts::PI / sample_rate).sin() * 0.25
    };

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let value: T = T::from_sample(next_value());
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                }
            },
            |err| log::error!("an error occurred on the audio stream: {err}"),
            None,
        )
        .context("failed to build audio stream")?;

    Ok(stream)
}
