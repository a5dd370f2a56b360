use crate::config::{ModemConfig, SerialConfig};
use crate::core::board::BoardHandle;
use crate::core::protocol::{self, MODE_COMMAND, RF_CONFIG_COMMAND, RX_ENABLE_COMMAND};
use crate::domain::model::RawChunk;
use crate::domain::ports::SerialLink;
use crate::utils::error::Result;
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Polls the radio link and splits its output into whitespace-delimited chunks.
pub struct FrameReader<L: SerialLink> {
    link: L,
    buffer: Vec<u8>,
    pending: VecDeque<RawChunk>,
    poll_interval: Duration,
    max_chunk_len: usize,
}

impl<L: SerialLink> FrameReader<L> {
    pub fn new(link: L, config: &SerialConfig) -> Self {
        Self {
            link,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            poll_interval: config.poll_interval(),
            max_chunk_len: config.max_chunk_len,
        }
    }

    /// Put the RAK811 into LoRa P2P receive mode.
    ///
    /// Every step logs the modem's reply. A failing step is logged and the
    /// handshake carries on; the modem may already be configured.
    pub fn initialize_modem(&mut self, modem: &ModemConfig) {
        let rf_config = format!("{}{}", RF_CONFIG_COMMAND, modem.rf_config);
        let steps = [
            ("set mode", MODE_COMMAND, modem.mode_settle()),
            ("set config", rf_config.as_str(), modem.command_settle()),
            ("set rx mode", RX_ENABLE_COMMAND, modem.command_settle()),
        ];

        for (label, command, settle) in steps {
            match self.exchange(command, settle) {
                Ok(reply) => tracing::info!("Configure RAK811, {}: {}", label, reply.trim()),
                Err(e) => tracing::warn!("⚠️ RAK811 {} failed: {}", label, e),
            }
        }
        tracing::info!("📡 RAK811 configured");
    }

    fn exchange(&mut self, command: &str, settle: Duration) -> Result<String> {
        self.link.write_all(&protocol::modem_command(command))?;
        thread::sleep(settle);

        let mut reply = Vec::new();
        let available = self.link.bytes_available()?;
        if available > 0 {
            reply.resize(available, 0);
            let read = self.link.read_available(&mut reply)?;
            reply.truncate(read);
        }
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    /// Next complete chunk, or `None` after at most one poll interval.
    pub fn next_chunk(&mut self) -> Result<Option<RawChunk>> {
        if let Some(chunk) = self.pending.pop_front() {
            return Ok(Some(chunk));
        }

        if self.fill()? == 0 {
            thread::sleep(self.poll_interval);
            return Ok(None);
        }

        self.split_chunks();
        Ok(self.pending.pop_front())
    }

    fn fill(&mut self) -> Result<usize> {
        let available = self.link.bytes_available()?;
        if available == 0 {
            return Ok(0);
        }

        let start = self.buffer.len();
        self.buffer.resize(start + available, 0);
        let read = self.link.read_available(&mut self.buffer[start..])?;
        self.buffer.truncate(start + read);
        Ok(read)
    }

    fn split_chunks(&mut self) {
        while let Some(end) = self.buffer.iter().position(u8::is_ascii_whitespace) {
            let mut chunk: Vec<u8> = self.buffer.drain(..=end).collect();
            chunk.pop();
            if !chunk.is_empty() {
                self.pending.push_back(RawChunk::new(chunk));
            }
        }

        if self.buffer.len() > self.max_chunk_len {
            tracing::warn!(
                "⚠️ Discarding {} unterminated bytes from the link",
                self.buffer.len()
            );
            self.buffer.clear();
        }
    }

    /// Decode chunks and forward judge commands until the board stops or the
    /// link fails. A link error ends the reader; it does not reconnect.
    pub fn run(mut self, board: BoardHandle) -> Result<()> {
        tracing::info!("📡 Frame reader started");
        let mut received: u64 = 0;

        while !board.is_closed() {
            let chunk = match self.next_chunk() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("❌ Serial link failed: {}", e);
                    return Err(e);
                }
            };

            received += 1;
            tracing::debug!("Received chunk #{} ({} bytes)", received, chunk.len());

            match protocol::decode_chunk(&chunk) {
                Ok(Some(command)) => {
                    tracing::debug!("Received command: {:?}", command);
                    if board.blocking_send(command).is_err() {
                        break;
                    }
                }
                Ok(None) => tracing::trace!(
                    "Ignoring chunk: {}",
                    String::from_utf8_lossy(chunk.as_bytes())
                ),
                Err(e) => tracing::warn!("⚠️ Dropped frame: {}", e),
            }
        }

        tracing::info!("Frame reader stopped");
        Ok(())
    }
}

/// Run the handshake (when enabled) and the read loop on a blocking thread.
pub fn spawn_frame_reader<L: SerialLink + 'static>(
    link: L,
    serial: &SerialConfig,
    modem: &ModemConfig,
    board: BoardHandle,
) -> JoinHandle<Result<()>> {
    let mut reader = FrameReader::new(link, serial);
    let modem = modem.enabled.then(|| modem.clone());

    tokio::task::spawn_blocking(move || {
        if let Some(modem) = modem {
            reader.initialize_modem(&modem);
        }
        reader.run(board)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::BoardMessage;
    use crate::domain::model::JudgeCommand;
    use crate::utils::error::BoardError;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    /// Link that hands out one scripted burst per poll.
    #[derive(Default)]
    struct ScriptedLink {
        bursts: VecDeque<Vec<u8>>,
        written: Arc<Mutex<Vec<u8>>>,
        fail_when_drained: bool,
        fail_writes: bool,
    }

    impl ScriptedLink {
        fn with_bursts(bursts: &[&[u8]]) -> Self {
            Self {
                bursts: bursts.iter().map(|b| b.to_vec()).collect(),
                ..Self::default()
            }
        }
    }

    impl SerialLink for ScriptedLink {
        fn bytes_available(&mut self) -> Result<usize> {
            match self.bursts.front() {
                Some(burst) => Ok(burst.len()),
                None if self.fail_when_drained => Err(BoardError::LinkIo(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "device unplugged",
                ))),
                None => Ok(0),
            }
        }

        fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
            let Some(burst) = self.bursts.pop_front() else {
                return Ok(0);
            };
            let n = burst.len().min(buf.len());
            buf[..n].copy_from_slice(&burst[..n]);
            if n < burst.len() {
                self.bursts.push_front(burst[n..].to_vec());
            }
            Ok(n)
        }

        fn write_all(&mut self, data: &[u8]) -> Result<()> {
            if self.fail_writes {
                return Err(BoardError::LinkIo(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "write timed out",
                )));
            }
            self.written.lock().unwrap().extend_from_slice(data);
            Ok(())
        }
    }

    fn fast_serial() -> SerialConfig {
        SerialConfig {
            poll_interval_ms: 1,
            max_chunk_len: 64,
            ..SerialConfig::default()
        }
    }

    fn instant_modem() -> ModemConfig {
        ModemConfig {
            mode_settle_ms: 0,
            command_settle_ms: 0,
            ..ModemConfig::default()
        }
    }

    #[test]
    fn test_chunk_split_across_reads() {
        let link = ScriptedLink::with_bursts(&[b"at+recv=0,0,28,", b"4944\r\n"]);
        let mut reader = FrameReader::new(link, &fast_serial());

        assert_eq!(reader.next_chunk().unwrap(), None);
        assert_eq!(
            reader.next_chunk().unwrap(),
            Some(RawChunk::from("at+recv=0,0,28,4944"))
        );
    }

    #[test]
    fn test_several_chunks_in_one_read() {
        let link = ScriptedLink::with_bursts(&[b"OK\r\n\r\nat+recv=0,0,1,41\r\n"]);
        let mut reader = FrameReader::new(link, &fast_serial());

        assert_eq!(reader.next_chunk().unwrap(), Some(RawChunk::from("OK")));
        assert_eq!(
            reader.next_chunk().unwrap(),
            Some(RawChunk::from("at+recv=0,0,1,41"))
        );
        assert_eq!(reader.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_idle_link_returns_after_poll_interval() {
        let mut reader = FrameReader::new(ScriptedLink::default(), &fast_serial());
        assert_eq!(reader.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_runaway_garbage_is_discarded() {
        let garbage = vec![b'x'; 100];
        let link = ScriptedLink::with_bursts(&[&garbage, b"OK\n"]);
        let mut reader = FrameReader::new(link, &fast_serial());

        assert_eq!(reader.next_chunk().unwrap(), None);
        assert_eq!(reader.next_chunk().unwrap(), Some(RawChunk::from("OK")));
    }

    #[test]
    fn test_modem_handshake_writes_three_commands() {
        let link = ScriptedLink::with_bursts(&[b"OK\r\n", b"OK\r\n", b"OK\r\n"]);
        let written = Arc::clone(&link.written);
        let mut reader = FrameReader::new(link, &fast_serial());

        reader.initialize_modem(&instant_modem());

        let written = written.lock().unwrap().clone();
        assert_eq!(
            String::from_utf8(written).unwrap(),
            "at+mode=1P\r\nat+rf_config=867700000,10,0,1,8,14P\r\nat+rxc=1P\r\n"
        );
        assert_eq!(reader.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_modem_handshake_failure_is_not_fatal() {
        let link = ScriptedLink {
            fail_writes: true,
            ..ScriptedLink::default()
        };
        let mut reader = FrameReader::new(link, &fast_serial());
        reader.initialize_modem(&instant_modem());
        assert_eq!(reader.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_run_forwards_commands_until_link_fails() {
        let start = format!("{}\r\n", protocol::encode_frame("ID8888888888888888COM3P00END"));
        let count = format!("{}\r\n", protocol::encode_frame("ID8888888888888888COM1P0007END"));
        let link = ScriptedLink {
            fail_when_drained: true,
            ..ScriptedLink::with_bursts(&[
                start.as_bytes(),
                b"at+recv=0,0,3,ZZ\r\n",
                b"OK\r\n",
                count.as_bytes(),
            ])
        };
        let (tx, mut rx) = mpsc::channel(8);
        let reader = FrameReader::new(link, &fast_serial());

        let outcome = reader.run(BoardHandle::new(tx));

        assert!(matches!(outcome, Err(BoardError::LinkIo(_))));
        let mut commands = Vec::new();
        while let Ok(BoardMessage::Judge(command)) = rx.try_recv() {
            commands.push(command);
        }
        assert_eq!(
            commands,
            vec![JudgeCommand::StartTimer, JudgeCommand::SetAbsolute(7)]
        );
    }

    #[test]
    fn test_run_stops_when_board_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let reader = FrameReader::new(ScriptedLink::default(), &fast_serial());
        assert!(reader.run(BoardHandle::new(tx)).is_ok());
    }
}
