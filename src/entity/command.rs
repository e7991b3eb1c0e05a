//! Child-process entity source.
//!
//! The model is loaded once by a long-running helper process (typically a
//! small Python script around the trained sequence tagger). Each line is
//! sent as one JSON object on the helper's stdin:
//!
//! ```text
//! {"text":"Jan de Vries reisde naar Utrecht"}
//! ```
//!
//! and the helper answers with exactly one JSON line on stdout, either a
//! bare span array, an object with a `spans` array, or an object with an
//! `error` message:
//!
//! ```text
//! [{"label":"PER","offset":0,"length":12}]
//! {"spans":[{"label":"PER","offset":0,"length":12}]}
//! {"error":"model crashed"}
//! ```
//!
//! The helper is expected to exit when its stdin is closed.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};

use super::{EntitySource, EntitySpan};
use crate::error::PagetagError;

#[derive(Serialize)]
struct TagRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagResponse {
    Spans(Vec<EntitySpan>),
    Wrapped { spans: Vec<EntitySpan> },
    Failed { error: String },
}

/// Entity source backed by a helper process speaking JSON lines.
pub struct CommandTagger {
    program: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    buffer: String,
}

impl CommandTagger {
    /// Start `program` with `args`.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, PagetagError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| PagetagError::TaggerUnavailable {
                message: format!("failed to start '{program}': {source}"),
            })?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PagetagError::TaggerUnavailable {
                message: format!("'{program}' has no stdout pipe"),
            })?;

        tracing::debug!(program, ?args, "started tagger process");

        Ok(Self {
            program: program.to_string(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
            buffer: String::new(),
        })
    }

    /// Start a helper from a whitespace-separated command line, appending
    /// `model` as the final argument when given.
    ///
    /// No shell quoting is interpreted. The model path must exist.
    pub fn from_command_line(
        command_line: &str,
        model: Option<&Path>,
    ) -> Result<Self, PagetagError> {
        let mut words = command_line.split_whitespace();
        let program = words.next().ok_or_else(|| PagetagError::TaggerUnavailable {
            message: "tagger command is empty".to_string(),
        })?;
        let mut args: Vec<String> = words.map(str::to_string).collect();

        if let Some(model) = model {
            if !model.is_file() {
                return Err(PagetagError::TaggerUnavailable {
                    message: format!("model file not found: {}", model.display()),
                });
            }
            args.push(model.to_string_lossy().into_owned());
        }

        Self::spawn(program, &args)
    }
}

fn failure(program: &str, message: impl std::fmt::Display) -> PagetagError {
    PagetagError::TaggerFailed {
        message: format!("'{program}': {message}"),
    }
}

impl EntitySource for CommandTagger {
    fn tag_line(&mut self, text: &str) -> Result<Vec<EntitySpan>, PagetagError> {
        let mut request = serde_json::to_string(&TagRequest { text }).map_err(|source| {
            failure(&self.program, format!("could not encode request: {source}"))
        })?;
        request.push('\n');

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(failure(&self.program, "stdin is closed"));
        };
        stdin
            .write_all(request.as_bytes())
            .and_then(|_| stdin.flush())
            .map_err(|source| failure(&self.program, format!("could not send line: {source}")))?;

        self.buffer.clear();
        let read = self
            .stdout
            .read_line(&mut self.buffer)
            .map_err(|source| failure(&self.program, format!("could not read reply: {source}")))?;
        if read == 0 {
            return Err(failure(&self.program, "process exited before replying"));
        }

        let reply = self.buffer.trim_end();
        match serde_json::from_str::<TagResponse>(reply) {
            Ok(TagResponse::Spans(spans)) | Ok(TagResponse::Wrapped { spans }) => Ok(spans),
            Ok(TagResponse::Failed { error }) => Err(failure(&self.program, error)),
            Err(source) => Err(failure(
                &self.program,
                format!("unexpected reply {reply:?}: {source}"),
            )),
        }
    }
}

impl Drop for CommandTagger {
    fn drop(&mut self) {
        // Closing stdin is the helper's signal to exit.
        drop(self.stdin.take());
        if let Err(source) = self.child.wait() {
            tracing::warn!(program = %self.program, error = %source, "failed to reap tagger process");
        }
    }
}
