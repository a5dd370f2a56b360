use crate::core::roster::AthleteRoster;
use crate::domain::model::Submission;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Byte-level access to the radio modem.
///
/// Reads never wait for data: callers ask how much is buffered and pace
/// themselves with their own poll delay.
pub trait SerialLink: Send {
    fn bytes_available(&mut self) -> Result<usize>;
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;
    fn write_all(&mut self, data: &[u8]) -> Result<()>;
}

impl<L: SerialLink + ?Sized> SerialLink for Box<L> {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_available(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }
}

/// Remote scoring backend holding rosters and results.
#[async_trait]
pub trait ScoreBackend: Send + Sync + 'static {
    async fn fetch_roster(&self, platform: u32, competition: u32) -> Result<AthleteRoster>;

    /// Returns the backend's response body.
    async fn submit_result(&self, submission: &Submission) -> Result<String>;
}
