use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{DubError, Result};

/// Abstract external-tool command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    pub timeout: Option<Duration>,
}

impl MediaCommand {
    /// Create a new command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            timeout: None,
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Kill the process if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add a lavfi virtual input (e.g. a silence source)
    pub fn lavfi_input<S: Into<String>>(self, source: S) -> Self {
        self.arg("-f").arg("lavfi").arg("-i").arg(source)
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Keep ffmpeg quiet apart from errors
    pub fn quiet(self) -> Self {
        self.arg("-hide_banner").arg("-loglevel").arg("error")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy video stream
    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Limit output duration (seconds)
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(format!("{:.3}", seconds))
    }

    /// Select a stream or filter label for the output
    pub fn map<S: Into<String>>(self, spec: S) -> Self {
        self.arg("-map").arg(spec)
    }

    /// Add a filter graph
    pub fn filter_complex<S: Into<String>>(self, graph: S) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    /// Stop at the end of the shortest input stream
    pub fn shortest(self) -> Self {
        self.arg("-shortest")
    }

    /// Execute the command and discard its output
    pub async fn execute(&self) -> Result<()> {
        self.run().await.map(|_| ())
    }

    /// Execute the command and return its stdout
    pub async fn execute_capture(&self) -> Result<String> {
        let stdout = self.run().await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    async fn run(&self) -> Result<Vec<u8>> {
        debug!("Executing external command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| DubError::Timeout(format!("{} (after {:?})", self.description, limit)))?,
            None => cmd.output().await,
        }
        .map_err(|e| DubError::Media(format!("Failed to execute {}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DubError::Media(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

/// Builder for the ffmpeg/ffprobe operations the pipeline needs
pub struct MediaCommandBuilder {
    binary_path: String,
    probe_path: String,
    timeout: Duration,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, probe_path: S2, timeout: Duration) -> Self {
        Self {
            binary_path: binary_path.into(),
            probe_path: probe_path.into(),
            timeout,
        }
    }

    fn ffmpeg<S: Into<String>>(&self, description: S) -> MediaCommand {
        MediaCommand::new(&self.binary_path, description)
            .with_timeout(self.timeout)
            .quiet()
    }

    /// Build silence generation command (stereo PCM WAV)
    pub fn generate_silence<P: AsRef<Path>>(
        &self,
        duration_secs: f64,
        sample_rate: u32,
        output_path: P,
    ) -> MediaCommand {
        self.ffmpeg("Silence generation")
            .lavfi_input(format!("anullsrc=channel_layout=stereo:sample_rate={}", sample_rate))
            .duration(duration_secs)
            .audio_codec("pcm_s16le")
            .overwrite()
            .output(output_path)
    }

    /// Build audio concatenation command.
    /// Every input is resampled to one format first so the concat filter accepts
    /// a mix of synthesized speech and generated silence.
    pub fn concatenate_audio<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        sample_rate: u32,
        output_path: P,
    ) -> MediaCommand {
        let mut cmd = self.ffmpeg(format!("Audio concatenation of {} files", inputs.len()));
        for input in inputs {
            cmd = cmd.input(input);
        }

        let mut graph = String::new();
        for index in 0..inputs.len() {
            graph.push_str(&format!(
                "[{index}:a:0]aresample={sample_rate},aformat=sample_fmts=s16:channel_layouts=stereo[a{index}];"
            ));
        }
        for index in 0..inputs.len() {
            graph.push_str(&format!("[a{index}]"));
        }
        graph.push_str(&format!("concat=n={}:v=0:a=1[out]", inputs.len()));

        cmd.filter_complex(graph)
            .map("[out]")
            .audio_codec("pcm_s16le")
            .overwrite()
            .output(output_path)
    }

    /// Build single-file audio transcode command
    pub fn copy_audio<P: AsRef<Path>>(&self, input: P, sample_rate: u32, output_path: P) -> MediaCommand {
        self.ffmpeg("Audio copy")
            .input(input)
            .audio_sample_rate(sample_rate)
            .audio_channels(2)
            .audio_codec("pcm_s16le")
            .overwrite()
            .output(output_path)
    }

    /// Build video/audio merge command: video copied, audio encoded, cut to the shorter stream
    pub fn merge_video_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        audio_codec: &str,
        output_path: P,
    ) -> MediaCommand {
        self.ffmpeg("Video/audio merge")
            .input(video_path)
            .input(audio_path)
            .map("0:v:0")
            .map("1:a:0")
            .copy_video()
            .audio_codec(audio_codec)
            .shortest()
            .overwrite()
            .output(output_path)
    }

    /// Build duration probe command; prints the duration in seconds
    pub fn probe_duration<P: AsRef<Path>>(&self, path: P) -> MediaCommand {
        MediaCommand::new(&self.probe_path, "Duration probe")
            .with_timeout(self.timeout)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .with_timeout(self.timeout)
            .arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg", "ffprobe", Duration::from_secs(5))
    }

    #[test]
    fn test_generate_silence_args() {
        let cmd = builder().generate_silence(1.25, 22050, PathBuf::from("/tmp/s.wav"));
        let joined = cmd.args.join(" ");
        assert!(joined.contains("-f lavfi -i anullsrc=channel_layout=stereo:sample_rate=22050"));
        assert!(joined.contains("-t 1.250"));
        assert!(joined.ends_with("-y /tmp/s.wav"));
        assert_eq!(cmd.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_concatenate_builds_filter_graph_in_order() {
        let inputs = vec![PathBuf::from("a.mp3"), PathBuf::from("gap.wav"), PathBuf::from("b.mp3")];
        let cmd = builder().concatenate_audio(&inputs, 22050, PathBuf::from("out.wav"));

        let inputs_in_args: Vec<&String> = cmd
            .args
            .iter()
            .zip(cmd.args.iter().skip(1))
            .filter(|(flag, _)| flag.as_str() == "-i")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(inputs_in_args, vec!["a.mp3", "gap.wav", "b.mp3"]);

        let graph_pos = cmd.args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &cmd.args[graph_pos + 1];
        assert!(graph.starts_with("[0:a:0]aresample=22050"));
        assert!(graph.ends_with("[a0][a1][a2]concat=n=3:v=0:a=1[out]"));
        assert!(cmd.args.windows(2).any(|w| w[0] == "-map" && w[1] == "[out]"));
    }

    #[test]
    fn test_merge_maps_video_from_first_and_audio_from_second_input() {
        let cmd = builder().merge_video_audio(
            PathBuf::from("video.mp4"),
            PathBuf::from("final_audio.wav"),
            "aac",
            PathBuf::from("dubbed_video.mp4"),
        );
        let joined = cmd.args.join(" ");
        assert!(joined.contains("-map 0:v:0 -map 1:a:0 -c:v copy -c:a aac -shortest"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_media_error() {
        let cmd = MediaCommand::new("definitely-not-a-real-binary-xyz", "Probe").arg("-version");
        let result = cmd.execute().await;
        assert!(matches!(result, Err(DubError::Media(_))));
    }
}
