use super::{RemoteSource, SyncError};
use suppaftp::types::FileType;
use suppaftp::FtpStream;
use tracing::info;

/// Anonymous, binary mode FTP session.
pub struct FtpSource {
    stream: FtpStream,
}

impl FtpSource {
    pub fn connect(host: &str) -> Result<Self, SyncError> {
        let mut stream = FtpStream::connect(format!("{host}:21"))?;
        stream.login("anonymous", "anonymous")?;
        stream.transfer_type(FileType::Binary)?;
        info!("Connected to {host}");
        Ok(Self { stream })
    }

    pub fn quit(mut self) -> Result<(), SyncError> {
        self.stream.quit()?;
        Ok(())
    }
}

impl RemoteSource for FtpSource {
    fn list(&mut self, path: &str) -> Result<Vec<String>, SyncError> {
        Ok(self.stream.nlst(Some(path))?)
    }

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, SyncError> {
        Ok(self.stream.retr_as_buffer(path)?.into_inner())
    }
}
