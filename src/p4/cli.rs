//! [`Session`] backed by the `p4` command-line client.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use super::tagged::{self, Record, TaggedLine};
use super::{ClientSpec, ConnectError, Depot, P4Error, Session, StreamInfo, SyncOutput};

const P4_PROGRAM: &str = "p4";

/// Files between progress log lines during a sync
const PROGRESS_INTERVAL: usize = 1000;

/// Session that runs one `p4` process per command.
///
/// The login ticket is kept in memory and handed to each process through
/// `P4PASSWD`, so nothing is written to the user's ticket file.
pub struct P4CliSession {
    program: PathBuf,
    port: String,
    user: String,
    credential: String,
}

impl P4CliSession {
    /// Log in with `p4 login -p` and keep the resulting ticket
    pub async fn login(port: &str, user: &str, password: &str) -> Result<Self, ConnectError> {
        Self::login_with(P4_PROGRAM, port, user, password).await
    }

    /// Like [`login`](Self::login) with an explicit path to the `p4` binary
    pub async fn login_with(
        program: impl Into<PathBuf>,
        port: &str,
        user: &str,
        password: &str,
    ) -> Result<Self, ConnectError> {
        let program = program.into();
        log::debug!("Logging in to {port} as {user}");

        let mut child = Command::new(&program)
            .args(["-p", port, "-u", user, "login", "-p"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ConnectError::ClientUnavailable)?;

        if let Some(mut stdin) = child.stdin.take() {
            // p4 may exit before reading the password, e.g. when the server is down
            if let Err(e) = stdin.write_all(format!("{password}\n").as_bytes()).await {
                log::debug!("Could not send password to p4 login: {e}");
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(ConnectError::ClientUnavailable)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(ConnectError::Authentication {
                port: port.to_string(),
                user: user.to_string(),
                message,
            });
        }

        let credential = ticket_from_login(&stdout).unwrap_or_else(|| password.to_string());

        Ok(Self {
            program,
            port: port.to_string(),
            user: user.to_string(),
            credential,
        })
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-p", &self.port, "-u", &self.user])
            .args(args)
            .env("P4PASSWD", &self.credential)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run a command in tagged JSON mode and collect its records
    async fn run_tagged(&self, args: &[&str]) -> Result<Vec<Record>, P4Error> {
        let label = format!("p4 {}", args.join(" "));
        log::debug!("Running {label}");

        let mut full = vec!["-Mj", "-ztag"];
        full.extend_from_slice(args);

        let output = self
            .command(&full)
            .output()
            .await
            .map_err(|source| P4Error::Spawn {
                command: label.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (records, messages) = tagged::parse_output(&stdout)?;
        let errors: Vec<_> = messages
            .into_iter()
            .filter(|m| m.severity.is_error())
            .map(|m| m.text)
            .collect();

        if !output.status.success() || !errors.is_empty() {
            let message = if errors.is_empty() {
                String::from_utf8_lossy(&output.stderr).trim().to_string()
            } else {
                errors.join("; ")
            };
            return Err(P4Error::Command {
                command: label,
                message,
            });
        }

        Ok(records)
    }

    /// Run a command in plain mode, optionally feeding `input` on stdin
    async fn run_plain(&self, args: &[&str], input: Option<&str>) -> Result<String, P4Error> {
        let label = format!("p4 {}", args.join(" "));
        log::debug!("Running {label}");

        let mut cmd = self.command(args);
        if input.is_some() {
            cmd.stdin(Stdio::piped());
        }
        let mut child = cmd.spawn().map_err(|source| P4Error::Spawn {
            command: label.clone(),
            source,
        })?;

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            // On early exit the reason is on stderr, not in the write error
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                log::debug!("Could not write input to {label}: {e}");
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(P4Error::Command {
                command: label,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl Session for P4CliSession {
    fn current_user(&self) -> &str {
        &self.user
    }

    fn port(&self) -> &str {
        &self.port
    }

    async fn depots(&self) -> Result<Vec<Depot>, P4Error> {
        let records = self.run_tagged(&["depots"]).await?;
        Ok(records
            .iter()
            .filter_map(|r| {
                Some(Depot {
                    name: r.get("name")?.to_string(),
                    depot_type: r.get("type").unwrap_or_default().to_string(),
                    description: r.get("desc").unwrap_or_default().trim().to_string(),
                })
            })
            .collect())
    }

    async fn streams(&self, depot: &str) -> Result<Vec<StreamInfo>, P4Error> {
        let filter = format!("//{depot}/...");
        let records = self.run_tagged(&["streams", &filter]).await?;
        Ok(records
            .iter()
            .filter_map(|r| {
                Some(StreamInfo {
                    path: r.get("Stream")?.to_string(),
                    stream_type: r.get("Type").map(str::to_string),
                    description: r
                        .get("Description")
                        .or_else(|| r.get("desc"))
                        .map(|d| d.trim().to_string()),
                })
            })
            .collect())
    }

    async fn save_client(&self, spec: &ClientSpec) -> Result<(), P4Error> {
        let reply = self.run_plain(&["client", "-i"], Some(&spec.to_form())).await?;
        log::debug!("{reply}");
        Ok(())
    }

    async fn delete_client(&self, name: &str) -> Result<(), P4Error> {
        let reply = self.run_plain(&["client", "-d", name], None).await?;
        log::debug!("{reply}");
        Ok(())
    }

    async fn sync(&self, client: &str) -> Result<SyncOutput, P4Error> {
        let label = format!("p4 -c {client} sync");
        log::debug!("Running {label}");

        let mut child = self
            .command(&["-Mj", "-ztag", "-c", client, "sync"])
            .spawn()
            .map_err(|source| P4Error::Spawn {
                command: label.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| P4Error::Malformed("sync stdout was not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| P4Error::Malformed("sync stderr was not captured".to_string()))?;

        let read_stdout = async {
            let mut output = SyncOutput::default();
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                match tagged::parse_line(&line) {
                    Ok(Some(TaggedLine::Record(record))) if record.has("depotFile") => {
                        output.file_count += 1;
                        if output.file_count % PROGRESS_INTERVAL == 0 {
                            log::debug!("{} files synced so far", output.file_count);
                        }
                    }
                    Ok(Some(TaggedLine::Message(message))) if message.severity.is_error() => {
                        output.errors.push(message.text);
                    }
                    Ok(Some(TaggedLine::Message(message))) => output.warnings.push(message.text),
                    Ok(_) => {}
                    Err(e) => log::debug!("Ignoring sync output line: {e}"),
                }
            }
            Ok::<_, P4Error>(output)
        };
        let read_stderr = async {
            let mut text = String::new();
            stderr.read_to_string(&mut text).await?;
            Ok::<_, P4Error>(text)
        };

        let (mut output, stderr_text) = tokio::try_join!(read_stdout, read_stderr)?;
        let status = child.wait().await?;

        for line in stderr_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line.contains("up-to-date") {
                output.warnings.push(line.to_string());
            } else {
                output.errors.push(line.to_string());
            }
        }

        if !status.success() {
            if output.file_count == 0 {
                let message = if output.errors.is_empty() {
                    format!("exited with {status}")
                } else {
                    output.errors.join("; ")
                };
                return Err(P4Error::Command {
                    command: label,
                    message,
                });
            }
            if output.errors.is_empty() {
                output.errors.push(format!("p4 sync ended with {status}"));
            }
        }

        Ok(output)
    }

    async fn disconnect(&self) {
        // Every command is its own process; dropping the ticket is enough
        log::debug!("Closing session to {} as {}", self.port, self.user);
    }
}

/// Ticket printed by `p4 login -p`, or `None` when the server needs no login
fn ticket_from_login(stdout: &str) -> Option<String> {
    if stdout.contains("not necessary") {
        return None;
    }

    stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .and_then(|l| l.split_whitespace().last())
        .map(str::to_string)
}
