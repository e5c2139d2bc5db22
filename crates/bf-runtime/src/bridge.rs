use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use bf_core::{BenchError, Dimension, FunctionRecord};
use parking_lot::Mutex;
use regex::Regex;

pub const DEFAULT_EVALUATOR_PROGRAM: &str = "Rscript";
pub const DEFAULT_EVALUATION_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq)]
pub enum EvalValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl EvalValue {
    pub fn to_values(&self) -> Vec<f64> {
        match self {
            Self::Scalar(value) => vec![*value],
            Self::Vector(values) => values.clone(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Scalar(_) => "a single number".to_string(),
            Self::Vector(values) => format!("a vector of {} numbers", values.len()),
        }
    }
}

impl From<f64> for EvalValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for EvalValue {
    fn from(values: Vec<f64>) -> Self {
        Self::Vector(values)
    }
}

impl From<&[f64]> for EvalValue {
    fn from(values: &[f64]) -> Self {
        Self::Vector(values.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorConfig {
    /// Interpreter run as `program [args...] <scratch file>`.
    pub program: String,
    pub args: Vec<String>,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    /// Overrides the catalog directory when resolving implementation paths.
    pub artifact_root: Option<PathBuf>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_EVALUATOR_PROGRAM.to_string(),
            args: Vec::new(),
            timeout: Some(DEFAULT_EVALUATION_TIMEOUT),
            artifact_root: None,
        }
    }
}

/// Runs a function's implementation artifact in an external interpreter.
///
/// The artifact itself is never written: each call copies it into a scratch
/// file with the call expression appended, and the scratch file is removed
/// when the call returns on any path. Calls against the same artifact are
/// serialized by a process-wide lock.
#[derive(Debug, Clone, Default)]
pub struct EvaluatorBridge {
    config: EvaluatorConfig,
}

impl EvaluatorBridge {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        record: &FunctionRecord,
        catalog_root: &Path,
        point: &EvalValue,
        parameters: &BTreeMap<String, EvalValue>,
    ) -> Result<f64, BenchError> {
        let function = record.name.as_str();
        let point = validate_point(record, point)?;
        for name in parameters.keys() {
            if !is_parameter_name(name) {
                return Err(BenchError::InvalidParameter { name: name.clone() });
            }
        }

        let reference = record.implementation.as_deref().ok_or_else(|| {
            BenchError::evaluation_failed(function, "function has no implementation artifact")
        })?;
        let root = self.config.artifact_root.as_deref().unwrap_or(catalog_root);
        let artifact = root.join(reference);

        let lock = artifact_lock(&artifact);
        let _guard = lock.lock();

        let source = fs::read_to_string(&artifact).map_err(|error| {
            BenchError::evaluation_failed(
                function,
                format!("failed to read {}: {}", artifact.display(), error),
            )
        })?;
        let entry = entry_routine(&source).ok_or_else(|| {
            BenchError::evaluation_failed(
                function,
                format!("no entry routine found in {}", artifact.display()),
            )
        })?;
        let call = render_call(entry, &point, parameters);
        log::debug!("evaluating {} via {}: {}", function, artifact.display(), call);

        let scratch = write_scratch(&artifact, &source, &call).map_err(|error| {
            BenchError::evaluation_failed(function, format!("failed to write scratch file: {}", error))
        })?;
        let stdout = self.run(function, &artifact, scratch.path())?;
        parse_evaluator_output(function, &stdout)
    }

    fn run(&self, function: &str, artifact: &Path, scratch: &Path) -> Result<String, BenchError> {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .arg(scratch)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = artifact.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            command.current_dir(dir);
        }

        let deadline = self.config.timeout.map(|timeout| Instant::now() + timeout);
        let mut child = command.spawn().map_err(|error| {
            log::warn!("failed to launch {}: {}", self.config.program, error);
            BenchError::evaluation_failed(
                function,
                format!("failed to launch {}: {}", self.config.program, error),
            )
        })?;
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = wait_with_timeout(&mut child, deadline).map_err(|error| {
            BenchError::evaluation_failed(function, format!("failed to wait for evaluator: {}", error))
        })?;
        let Some(status) = status else {
            log::warn!("evaluator for {} timed out", function);
            return Err(self.timed_out(function, "evaluator timed out"));
        };

        // A process left running in the background can hold the pipes open
        // after the evaluator itself has exited.
        let (Some(stdout), Some(stderr)) = (
            collect_output(&stdout, deadline),
            collect_output(&stderr, deadline),
        ) else {
            log::warn!("output of evaluator for {} was still open at the deadline", function);
            return Err(self.timed_out(function, "evaluator output still open"));
        };
        if !status.success() {
            log::warn!("evaluator for {} exited with {}", function, status);
            return Err(BenchError::evaluation_failed(
                function,
                format!("evaluator exited with {}: {}", status, stderr.trim()),
            ));
        }
        Ok(stdout)
    }

    fn timed_out(&self, function: &str, what: &str) -> BenchError {
        BenchError::evaluation_failed(
            function,
            format!("{} after {:?}", what, self.config.timeout.unwrap_or_default()),
        )
    }
}

/// Checks the point against the record's dimension and flattens it.
pub fn validate_point(record: &FunctionRecord, point: &EvalValue) -> Result<Vec<f64>, BenchError> {
    let expected = match (record.dimension, point) {
        (Dimension::Parametric, _) => return Ok(point.to_values()),
        (Dimension::Fixed(1), EvalValue::Scalar(value)) => return Ok(vec![*value]),
        (Dimension::Fixed(1), _) => "a single number".to_string(),
        (Dimension::Fixed(n), EvalValue::Vector(values)) if values.len() == n => {
            return Ok(values.clone())
        }
        (Dimension::Fixed(n), _) => format!("a vector of {} numbers", n),
    };

    Err(BenchError::InvalidPoint {
        function: record.name.clone(),
        expected,
        found: point.describe(),
    })
}

/// Leading identifier of the first line that is neither blank nor a comment.
pub fn entry_routine(source: &str) -> Option<&str> {
    static ENTRY: OnceLock<Regex> = OnceLock::new();
    let regex = ENTRY.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z.][A-Za-z0-9._]*)").expect("entry routine regex must compile")
    });

    let line = source
        .lines()
        .find(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))?;
    regex
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

pub fn is_parameter_name(name: &str) -> bool {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9._]*$").expect("parameter name regex must compile")
    })
    .is_match(name)
}

/// `entry(c(x1, ..., xn), name=value, ...)` in R call syntax.
pub fn render_call(entry: &str, point: &[f64], parameters: &BTreeMap<String, EvalValue>) -> String {
    let mut call = format!("{}({}", entry, vector_literal(point));
    for (name, value) in parameters {
        let literal = match value {
            EvalValue::Scalar(value) => number_literal(*value),
            EvalValue::Vector(values) => vector_literal(values),
        };
        call.push_str(&format!(", {}={}", name, literal));
    }
    call.push(')');
    call
}

fn vector_literal(values: &[f64]) -> String {
    format!(
        "c({})",
        values
            .iter()
            .map(|value| number_literal(*value))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

fn number_literal(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{:?}", value)
    }
}

/// The evaluator prints `[1] value`; the result is the second token.
pub fn parse_evaluator_output(function: &str, stdout: &str) -> Result<f64, BenchError> {
    stdout
        .split_whitespace()
        .nth(1)
        .and_then(|token| token.parse::<f64>().ok())
        .ok_or_else(|| BenchError::MalformedEvaluatorOutput {
            function: function.to_string(),
            output: stdout.trim().to_string(),
        })
}

fn artifact_lock(artifact: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    let key = fs::canonicalize(artifact).unwrap_or_else(|_| artifact.to_path_buf());
    LOCKS
        .get_or_init(Default::default)
        .lock()
        .entry(key)
        .or_default()
        .clone()
}

fn write_scratch(
    artifact: &Path,
    source: &str,
    call: &str,
) -> std::io::Result<tempfile::NamedTempFile> {
    let suffix = artifact
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();
    let mut scratch = tempfile::Builder::new()
        .prefix("benchfn-")
        .suffix(&suffix)
        .tempfile()?;

    scratch.write_all(source.as_bytes())?;
    if !source.is_empty() && !source.ends_with('\n') {
        scratch.write_all(b"\n")?;
    }
    writeln!(scratch, "{}", call)?;
    scratch.flush()?;
    Ok(scratch)
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut source) = source {
            let _ = source.read_to_end(&mut buffer);
        }
        let _ = sender.send(String::from_utf8_lossy(&buffer).into_owned());
    });
    receiver
}

/// `None` means the stream was still open when the deadline passed.
fn collect_output(receiver: &Receiver<String>, deadline: Option<Instant>) -> Option<String> {
    let received = match deadline {
        None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        Some(deadline) => receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())),
    };
    match received {
        Ok(text) => Some(text),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

/// `Ok(None)` means the deadline passed and the child was killed.
fn wait_with_timeout(
    child: &mut Child,
    deadline: Option<Instant>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(deadline) = deadline else {
        return child.wait().map(Some);
    };

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod bridge_tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> FunctionRecord {
        FunctionRecord::from_json("test_function", value).expect("record should parse")
    }

    #[test]
    fn validate_point_follows_dimension() {
        let one = record(json!({"dimension": 1}));
        assert_eq!(validate_point(&one, &EvalValue::Scalar(0.5)), Ok(vec![0.5]));
        assert_eq!(
            validate_point(&one, &EvalValue::Vector(vec![0.5]))
                .expect_err("vector for 1-d")
                .code(),
            "INVALID_POINT"
        );

        let two = record(json!({"dimension": 2}));
        assert_eq!(
            validate_point(&two, &EvalValue::Vector(vec![1.0, 2.0])),
            Ok(vec![1.0, 2.0])
        );
        let error = validate_point(&two, &EvalValue::Vector(vec![1.0, 2.0, 3.0]))
            .expect_err("wrong length");
        assert_eq!(
            error.to_string(),
            "Point does not match function \"test_function\": expected a vector of 2 numbers, got a vector of 3 numbers."
        );
        assert!(validate_point(&two, &EvalValue::Scalar(1.0)).is_err());

        let any = record(json!({"dimension": "d"}));
        assert_eq!(validate_point(&any, &EvalValue::Scalar(3.0)), Ok(vec![3.0]));
        assert_eq!(
            validate_point(&any, &EvalValue::Vector(vec![0.0; 5])),
            Ok(vec![0.0; 5])
        );
    }

    #[test]
    fn entry_routine_skips_comments_and_blank_lines() {
        assert_eq!(
            entry_routine("spheref <- function(xx)\n{\n  sum(xx^2)\n}\n"),
            Some("spheref")
        );
        assert_eq!(
            entry_routine("\n# SPHERE FUNCTION\n\n  ackley <- function(xx, a=20)"),
            Some("ackley")
        );
        assert_eq!(entry_routine("# only a comment\n"), None);
        assert_eq!(entry_routine("<- nothing"), None);
    }

    #[test]
    fn render_call_uses_vector_literals_and_keywords() {
        let parameters = BTreeMap::from([
            ("m".to_string(), EvalValue::Scalar(10.0)),
            ("b".to_string(), EvalValue::Vector(vec![1.0, 2.5])),
        ]);
        assert_eq!(
            render_call("michal", &[0.5, -1.0], &parameters),
            "michal(c(0.5, -1.0), b=c(1.0, 2.5), m=10.0)"
        );
        assert_eq!(
            render_call("f", &[f64::INFINITY, f64::NEG_INFINITY, f64::NAN], &BTreeMap::new()),
            "f(c(Inf, -Inf, NaN))"
        );
    }

    #[test]
    fn parameter_names_must_be_identifiers() {
        assert!(is_parameter_name("m"));
        assert!(is_parameter_name("beta.2"));
        assert!(!is_parameter_name("2m"));
        assert!(!is_parameter_name("m); system('x'"));
        assert!(!is_parameter_name(""));
    }

    #[test]
    fn parse_evaluator_output_reads_second_token() {
        assert_eq!(parse_evaluator_output("f", "[1] 0\n"), Ok(0.0));
        assert_eq!(parse_evaluator_output("f", "[1] -1.0316\n"), Ok(-1.0316));
        assert_eq!(
            parse_evaluator_output("f", "").expect_err("empty").code(),
            "MALFORMED_EVALUATOR_OUTPUT"
        );
        assert_eq!(
            parse_evaluator_output("f", "[1] \"oops\"").expect_err("text").code(),
            "MALFORMED_EVALUATOR_OUTPUT"
        );
    }

    #[test]
    fn default_config_runs_rscript_with_timeout() {
        let config = EvaluatorConfig::default();
        assert_eq!(config.program, "Rscript");
        assert_eq!(config.timeout, Some(DEFAULT_EVALUATION_TIMEOUT));
        assert!(config.args.is_empty());
        assert_eq!(EvaluatorBridge::default().config(), &config);
    }

    #[test]
    fn missing_implementation_is_evaluation_failure() {
        let bridge = EvaluatorBridge::default();
        let record = record(json!({"dimension": 2}));
        let error = bridge
            .evaluate(
                &record,
                Path::new("."),
                &EvalValue::Vector(vec![0.0, 0.0]),
                &BTreeMap::new(),
            )
            .expect_err("no implementation");
        assert_eq!(error.code(), "EVALUATION_FAILED");

        let error = bridge
            .evaluate(
                &record,
                Path::new("."),
                &EvalValue::Vector(vec![0.0, 0.0]),
                &BTreeMap::from([("1bad".to_string(), EvalValue::Scalar(1.0))]),
            )
            .expect_err("bad parameter name");
        assert_eq!(error.code(), "INVALID_PARAMETER");
    }
}
