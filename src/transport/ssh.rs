use crate::remote::join;
use crate::transport::Session;
use crate::{FtpTreeError, Result};
use ssh2::{Session as Ssh2Session, Sftp};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub key_path: Option<PathBuf>,
    /// Applied once to the whole connection; individual steps have no timeout of their own.
    pub timeout: Option<Duration>,
}

/// [`Session`] over SSH: listings come from `ls -lA` on the remote shell,
/// everything else goes through SFTP. SFTP has no working directory, so it is
/// tracked here and every relative path is resolved against it.
pub struct SshSession {
    session: Ssh2Session,
    sftp: Sftp,
    cwd: String,
    tcp: TcpStream,
}

impl SshSession {
    pub fn connect(config: &SshConfig) -> Result<Self> {
        let tcp = match config.timeout {
            Some(timeout) => {
                let addr = (config.host.as_str(), config.port)
                    .to_socket_addrs()
                    .map_err(|e| FtpTreeError::Connection(format!("Failed to resolve {}: {}", config.host, e)))?
                    .next()
                    .ok_or_else(|| FtpTreeError::Connection(format!("No address for {}", config.host)))?;
                TcpStream::connect_timeout(&addr, timeout)
            }
            None => TcpStream::connect((config.host.as_str(), config.port)),
        }
        .map_err(|e| FtpTreeError::Connection(format!("Failed to connect to {}:{}: {}", config.host, config.port, e)))?;

        let mut session = Ssh2Session::new()
            .map_err(|e| FtpTreeError::Connection(e.to_string()))?;
        if let Some(timeout) = config.timeout {
            session.set_timeout(timeout.as_millis().min(u32::MAX as u128) as u32);
        }

        session.set_tcp_stream(tcp.try_clone()?);
        session.handshake()
            .map_err(|e| FtpTreeError::Connection(format!("Handshake failed: {}", e)))?;

        authenticate(&session, config)?;

        let sftp = session.sftp()
            .map_err(|e| FtpTreeError::Connection(format!("SFTP init failed: {}", e)))?;
        let cwd = sftp.realpath(Path::new("."))
            .map_err(|e| FtpTreeError::Connection(format!("Cannot resolve home directory: {}", e)))?
            .to_string_lossy()
            .to_string();

        Ok(Self { session, sftp, cwd, tcp })
    }

    fn resolve(&self, path: &str) -> String {
        if path.is_empty() || path == "." {
            self.cwd.clone()
        } else {
            join(&self.cwd, path)
        }
    }

    fn exec(&self, command: &str) -> Result<(i32, String)> {
        let mut channel = self.session.channel_session()
            .map_err(|e| FtpTreeError::Connection(format!("Channel open failed: {}", e)))?;
        channel.exec(command)
            .map_err(|e| FtpTreeError::Connection(format!("Exec failed: {}", e)))?;

        let mut s = String::new();
        channel.read_to_string(&mut s)?;

        channel.wait_close()
            .map_err(|e| FtpTreeError::Connection(format!("Channel close failed: {}", e)))?;
        let exit_status = channel.exit_status()
            .map_err(|e| FtpTreeError::Connection(format!("No exit status for {:?}: {}", command, e)))?;
        Ok((exit_status, s))
    }
}

/// Entry lines of an `ls -lA` run, or the directory error it printed.
fn listing_lines(path: &str, status: i32, output: &str) -> Result<Vec<String>> {
    if status != 0 {
        return Err(FtpTreeError::directory(path, output.trim()));
    }
    // `ls -l` prints a "total N" summary that is not an entry.
    Ok(output
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with("total "))
        .map(str::to_string)
        .collect())
}

fn authenticate(session: &Ssh2Session, config: &SshConfig) -> Result<()> {
    if let Some(password) = &config.password {
        session.userauth_password(&config.user, password)
            .map_err(|e| FtpTreeError::Authentication(format!("Password auth failed: {}", e)))?;
    } else if let Some(key) = &config.key_path {
        session.userauth_pubkey_file(&config.user, None, key, None)
            .map_err(|e| FtpTreeError::Authentication(format!("Key auth failed: {}", e)))?;
    } else if session.userauth_agent(&config.user).is_err() || !session.authenticated() {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).unwrap_or_default();
        let default_keys = [
            PathBuf::from(&home).join(".ssh/id_rsa"),
            PathBuf::from(&home).join(".ssh/id_ed25519"),
        ];
        for key in default_keys.iter().filter(|k| k.exists()) {
            if session.userauth_pubkey_file(&config.user, None, key, None).is_ok() && session.authenticated() {
                break;
            }
        }
    }

    if !session.authenticated() {
        return Err(FtpTreeError::Authentication("Authentication failed (Agent and default keys tried)".into()));
    }
    Ok(())
}

fn escape_posix_literal(value: &str) -> String {
    value.replace('\'', "'\\''")
}

impl Session for SshSession {
    fn list_entries(&mut self, path: &str) -> Result<Vec<String>> {
        let target = self.resolve(path);
        let (status, output) = self.exec(&format!("LC_ALL=C ls -lA -- '{}' 2>&1", escape_posix_literal(&target)))?;
        listing_lines(&target, status, &output)
    }

    fn change_directory(&mut self, path: &str) -> Result<()> {
        let target = self.resolve(path);
        let stat = self.sftp.stat(Path::new(&target))
            .map_err(|e| FtpTreeError::directory(&target, e))?;
        if !stat.is_dir() {
            return Err(FtpTreeError::directory(&target, "not a directory"));
        }
        let real = self.sftp.realpath(Path::new(&target))
            .map_err(|e| FtpTreeError::directory(&target, e))?;
        self.cwd = real.to_string_lossy().to_string();
        debug!("cwd -> {}", self.cwd);
        Ok(())
    }

    fn current_directory(&mut self) -> Result<String> {
        Ok(self.cwd.clone())
    }

    fn make_directory(&mut self, path: &str) -> Result<()> {
        let target = self.resolve(path);
        self.sftp.mkdir(Path::new(&target), 0o755)
            .map_err(|e| FtpTreeError::directory(&target, e))
    }

    fn remove_directory(&mut self, path: &str) -> Result<()> {
        let target = self.resolve(path);
        self.sftp.rmdir(Path::new(&target))
            .map_err(|e| FtpTreeError::directory(&target, e))
    }

    fn store(&mut self, remote: &str, source: &mut dyn Read) -> Result<u64> {
        let target = self.resolve(remote);
        let mut remote_file = self.sftp.create(Path::new(&target))
            .map_err(|e| FtpTreeError::transfer(&target, e))?;
        let n = std::io::copy(source, &mut remote_file)
            .map_err(|e| FtpTreeError::transfer(&target, e))?;
        Ok(n)
    }

    fn retrieve(&mut self, remote: &str, sink: &mut dyn Write) -> Result<u64> {
        let target = self.resolve(remote);
        let mut remote_file = self.sftp.open(Path::new(&target))
            .map_err(|e| FtpTreeError::transfer(&target, e))?;
        let n = std::io::copy(&mut remote_file, sink)
            .map_err(|e| FtpTreeError::transfer(&target, e))?;
        Ok(n)
    }

    fn delete(&mut self, remote: &str) -> Result<()> {
        let target = self.resolve(remote);
        self.sftp.unlink(Path::new(&target))
            .map_err(|e| FtpTreeError::transfer(&target, e))
    }

    fn quit(&mut self) -> Result<()> {
        self.session.disconnect(None, "bye", None)
            .map_err(|e| FtpTreeError::Connection(format!("Disconnect failed: {}", e)))
    }

    fn close(&mut self) -> Result<()> {
        self.tcp.shutdown(std::net::Shutdown::Both)?;
        Ok(())
    }
}
