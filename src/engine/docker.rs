//! Container engine: runs a command's step pipeline via the container CLI

use log::{debug, warn};
use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

use super::{fail, Execution, Files, Request};
use crate::config::{Action, BoxConfig, Config, StepConfig};
use crate::errors::{self, Error, ExecError};
use crate::execution::{Output, Program, RunError, Runner};
use crate::files;

/// Deadline for the background kill of a timed-out container
const KILL_TIMEOUT: Duration = Duration::from_secs(5);

/// Step version selecting the untagged box
const LATEST: &str = "latest";

/// Placeholder replaced by the request id
const NAME_VAR: &str = ":name";

/// Executes a specific sandbox command in containers.
///
/// All steps of one request share a fresh work directory, removed when
/// the request completes.
pub struct Docker {
    cfg: Arc<Config>,
    runner: Arc<dyn Runner>,
    entry: String,
    before: Option<StepConfig>,
    first: StepConfig,
    rest: Vec<StepConfig>,
    after: Option<StepConfig>,
}

impl Docker {
    pub fn new(
        cfg: Arc<Config>,
        sandbox: &str,
        command: &str,
        runner: Arc<dyn Runner>,
    ) -> errors::Result<Self> {
        let cmd = cfg.command(sandbox, command).cloned().ok_or_else(|| {
            Error::InvalidConfig(format!("{} {}: command not found", sandbox, command))
        })?;
        let mut steps = cmd.steps.into_iter();
        let first = steps.next().ok_or_else(|| {
            Error::InvalidConfig(format!("{} {}: command has no steps", sandbox, command))
        })?;
        Ok(Self {
            cfg,
            runner,
            entry: cmd.entry,
            before: cmd.before,
            first,
            rest: steps.collect(),
            after: cmd.after,
        })
    }

    /// Execute the command pipeline for the request
    pub fn exec(&self, req: &Request) -> Execution {
        let dir = match work_dir() {
            Ok(dir) => dir,
            Err(e) => return fail(&req.id, ExecError::execution("create temp dir", e)),
        };
        let out = self.exec_pipeline(req, dir.path());
        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            warn!("{}: failed to remove {}: {}", req.id, path.display(), e);
        }
        out
    }

    fn exec_pipeline(&self, req: &Request, dir: &Path) -> Execution {
        // without an entry file, request files only travel through stdin
        if !self.entry.is_empty() {
            if let Err(err) = files::write_files(dir, &req.files, &self.entry) {
                return fail(&req.id, err);
            }
        }

        if let Some(before) = &self.before {
            let out = self.exec_step(before, req, dir, None);
            if !out.ok {
                return out;
            }
        }

        let mut out = self.exec_step(&self.first, req, dir, Some(&req.files));
        if out.ok {
            // each step works on what the previous one left behind
            for step in &self.rest {
                out = self.exec_step(step, req, dir, None);
                if !out.ok {
                    break;
                }
            }
        }

        if let Some(after) = &self.after {
            let after_out = self.exec_step(after, req, dir, None);
            if out.ok && !after_out.ok {
                return after_out;
            }
        }
        out
    }

    fn exec_step(
        &self,
        step: &StepConfig,
        req: &Request,
        dir: &Path,
        input: Option<&Files>,
    ) -> Execution {
        let bx = match self.resolve_box(step, &req.version) {
            Ok(bx) => bx,
            Err(err) => return fail(&req.id, err),
        };
        if let Some(bx) = bx {
            if let Err(err) = files::copy_box_files(&bx.files, dir) {
                return fail(&req.id, err);
            }
        }
        match self.run_step(bx, step, &req.id, dir, input) {
            Ok(output) => Execution::success(&req.id, output.stdout, output.stderr),
            Err(err) => fail(&req.id, err),
        }
    }

    /// Select the box for a step. Only `run` steps need one, other actions
    /// address an existing container.
    fn resolve_box(&self, step: &StepConfig, version: &str) -> Result<Option<&BoxConfig>, ExecError> {
        if step.action() != Action::Run {
            return Ok(None);
        }
        let name = box_name(&step.box_name, &step.version, version);
        match self.cfg.boxes.get(&name) {
            Some(bx) => Ok(Some(bx)),
            None => Err(ExecError::UnknownBox(name)),
        }
    }

    fn run_step(
        &self,
        bx: Option<&BoxConfig>,
        step: &StepConfig,
        id: &str,
        dir: &Path,
        input: Option<&Files>,
    ) -> Result<Output, ExecError> {
        let prog = Program::new(
            Duration::from_secs(step.timeout),
            step.max_output,
            Arc::clone(&self.runner),
        );
        let args = build_args(bx, step, id, dir);
        debug!("{}: {} {}", id, self.cfg.container_cli, args.join(" "));

        let result = if step.stdin {
            let data = input.map(files::concat).unwrap_or_default();
            prog.run_stdin(data, id, &self.cfg.container_cli, &args)
        } else {
            prog.run(id, &self.cfg.container_cli, &args)
        };

        match result {
            Ok(output) => Ok(output),
            Err(RunError::Killed) => {
                // the process inside the container is not a child of the
                // cli process and keeps running until the container dies
                if step.action() == Action::Run {
                    self.kill_container(id);
                }
                Err(ExecError::Timeout)
            }
            Err(RunError::Exit {
                status,
                stdout,
                stderr,
            }) => Err(ExecError::UserCode(user_error(&status, &stdout, &stderr))),
            Err(RunError::Io(e)) => Err(ExecError::execution("execute code", e)),
        }
    }

    /// Kill the container in the background, logging the outcome
    fn kill_container(&self, id: &str) {
        let prog = Program::new(KILL_TIMEOUT, 1024, Arc::clone(&self.runner));
        let cli = self.cfg.container_cli.clone();
        let id = id.to_string();
        let spawned = thread::Builder::new()
            .name(format!("kill-{}", id))
            .spawn(move || {
                let args = vec!["kill".to_string(), id.clone()];
                match prog.run(&id, &cli, &args) {
                    Ok(_) => debug!("{}: {} kill ok", id, cli),
                    Err(e) => warn!("{}: {} kill failed: {}", id, cli, e),
                }
            });
        if let Err(e) = spawned {
            warn!("failed to spawn container kill thread: {}", e);
        }
    }
}

/// Work directory shared by the steps, accessible to the container user
fn work_dir() -> std::io::Result<TempDir> {
    let dir = tempfile::Builder::new().prefix("coderun-").tempdir()?;
    fs::set_permissions(dir.path(), Permissions::from_mode(files::DIR_MODE))?;
    Ok(dir)
}

/// Box name for a step, honoring the step version first, then the
/// request version. `latest` selects the untagged box.
fn box_name(name: &str, step_version: &str, req_version: &str) -> String {
    if step_version == LATEST {
        return name.to_string();
    }
    let version = if step_version.is_empty() {
        req_version
    } else {
        step_version
    };
    if version.is_empty() {
        name.to_string()
    } else {
        format!("{}:{}", name, version)
    }
}

/// Stdout and stderr of failed user code, annotated with the exit status
fn user_error(status: &str, stdout: &str, stderr: &str) -> String {
    let merged = match (stdout.is_empty(), stderr.is_empty()) {
        (true, _) => stderr.to_string(),
        (false, true) => stdout.to_string(),
        (false, false) => format!("{}\n{}", stdout, stderr),
    };
    if merged.is_empty() {
        status.to_string()
    } else {
        format!("{} ({})", merged, status)
    }
}

fn build_args(bx: Option<&BoxConfig>, step: &StepConfig, name: &str, dir: &Path) -> Vec<String> {
    let mut args = match (step.action(), bx) {
        (Action::Run, Some(bx)) => run_args(bx, step, name, dir),
        (Action::Exec, _) => exec_args(step, name),
        (Action::Stop, _) => stop_args(step, name),
        // a run step always has a resolved box
        (Action::Run, None) => vec!["version".to_string()],
    };
    args.extend(expand_vars(&step.command, name));
    args
}

fn run_args(bx: &BoxConfig, step: &StepConfig, name: &str, dir: &Path) -> Vec<String> {
    let mut args = vec![
        Action::Run.to_string(),
        "--rm".to_string(),
        "--name".to_string(),
        name.to_string(),
    ];
    if !bx.runtime.is_empty() {
        args.extend(["--runtime".to_string(), bx.runtime.clone()]);
    }
    args.extend([
        "--cpus".to_string(),
        bx.cpu.to_string(),
        "--memory".to_string(),
        format!("{}m", bx.memory),
        "--network".to_string(),
        bx.network.clone(),
        "--pids-limit".to_string(),
        bx.nproc.to_string(),
        "--user".to_string(),
        step.user.clone(),
    ]);
    if !bx.writable {
        args.push("--read-only".to_string());
    }
    if step.stdin {
        args.push("--interactive".to_string());
    }
    if step.detach {
        args.push("--detach".to_string());
    }
    if !bx.storage.is_empty() {
        args.extend(["--storage-opt".to_string(), format!("size={}", bx.storage)]);
    }
    if !bx.volume.is_empty() {
        let volume = bx.volume.replacen("%s", &dir.to_string_lossy(), 1);
        args.extend(["--volume".to_string(), volume]);
    }
    push_each(&mut args, "--tmpfs", bx.tmpfs.as_deref());
    push_each(&mut args, "--cap-add", bx.cap_add.as_deref());
    push_each(&mut args, "--cap-drop", bx.cap_drop.as_deref());
    push_each(&mut args, "--ulimit", bx.ulimit.as_deref());
    args.push(bx.image.clone());
    args
}

fn exec_args(step: &StepConfig, name: &str) -> Vec<String> {
    vec![
        Action::Exec.to_string(),
        "--interactive".to_string(),
        "--user".to_string(),
        step.user.clone(),
        expand_var(&step.box_name, name),
    ]
}

fn stop_args(step: &StepConfig, name: &str) -> Vec<String> {
    vec![Action::Stop.to_string(), expand_var(&step.box_name, name)]
}

fn push_each(args: &mut Vec<String>, flag: &str, values: Option<&[String]>) {
    for value in values.unwrap_or_default() {
        args.push(flag.to_string());
        args.push(value.clone());
    }
}

fn expand_var(arg: &str, name: &str) -> String {
    arg.replacen(NAME_VAR, name, 1)
}

/// Replace the first `:name` of every argument with the container name
fn expand_vars(command: &[String], name: &str) -> Vec<String> {
    command.iter().map(|arg| expand_var(arg, name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandConfig;
    use crate::engine::Engine as _;
    use crate::engine::AnyEngine;
    use crate::execution::{MockExit, MockOutput, MockRunner};
    use std::collections::HashMap;

    fn test_box(image: &str) -> BoxConfig {
        BoxConfig {
            image: image.to_string(),
            runtime: "runc".to_string(),
            cpu: 1,
            memory: 64,
            network: "none".to_string(),
            volume: "%s:/sandbox:ro".to_string(),
            nproc: 64,
            ..Default::default()
        }
    }

    fn step(bx: &str, action: Action, command: &[&str]) -> StepConfig {
        StepConfig {
            box_name: bx.to_string(),
            user: "sandbox".to_string(),
            action: Some(action),
            command: command.iter().map(|s| s.to_string()).collect(),
            timeout: 3,
            max_output: 4096,
            ..Default::default()
        }
    }

    fn command(
        before: Option<StepConfig>,
        steps: Vec<StepConfig>,
        after: Option<StepConfig>,
    ) -> CommandConfig {
        CommandConfig {
            engine: "docker".to_string(),
            before,
            steps,
            after,
            ..Default::default()
        }
    }

    fn test_config() -> Arc<Config> {
        let mut cfg = Config::default();
        for (name, image) in [
            ("alpine", "codapi/alpine"),
            ("go", "codapi/go"),
            ("go:dev", "codapi/go:dev"),
            ("python", "codapi/python"),
            ("python:dev", "codapi/python:dev"),
        ] {
            cfg.boxes.insert(name.to_string(), test_box(image));
        }

        let mut before = step("alpine", Action::Run, &["echo", "before"]);
        before.detach = true;
        let alpine = command(
            Some(before),
            vec![step(":name", Action::Exec, &["sh", "main.sh"])],
            Some(step(":name", Action::Stop, &[])),
        );

        let mut alpine_step = step("alpine", Action::Run, &["./main"]);
        alpine_step.version = "latest".to_string();
        let go = command(
            None,
            vec![step("go", Action::Run, &["go", "build"]), alpine_step],
            None,
        );

        let mut psql = step("postgres", Action::Exec, &["psql", "--user=:name"]);
        psql.stdin = true;
        let postgres = command(
            Some(step("postgres", Action::Exec, &["psql", "-f", "create.sql"])),
            vec![psql],
            Some(step("postgres", Action::Exec, &["psql", "-f", "drop.sql"])),
        );

        let mut python = command(
            None,
            vec![step("python", Action::Run, &["python", "main.py"])],
            None,
        );
        python.entry = "main.py".to_string();

        let mut pipeline = command(
            None,
            vec![
                step("python", Action::Run, &["python", "build.py"]),
                step("alpine", Action::Run, &["./main"]),
            ],
            Some(step("alpine", Action::Exec, &["cleanup"])),
        );
        pipeline.entry = "main.py".to_string();

        for (sandbox, name, cmd) in [
            ("alpine", "echo", alpine),
            ("go", "run", go),
            ("postgresql", "run", postgres),
            ("python", "run", python),
            ("python", "pipeline", pipeline),
        ] {
            cfg.commands
                .entry(sandbox.to_string())
                .or_insert_with(HashMap::new)
                .insert(name.to_string(), cmd);
        }
        Arc::new(cfg)
    }

    fn engine(sandbox: &str, cmd: &str, runner: &Arc<MockRunner>) -> Docker {
        let runner: Arc<dyn Runner> = runner.clone();
        Docker::new(test_config(), sandbox, cmd, runner).unwrap()
    }

    fn request(sandbox: &str, version: &str, files: &[(&str, &str)]) -> Request {
        Request {
            id: "http_42".to_string(),
            sandbox: sandbox.to_string(),
            version: version.to_string(),
            command: "run".to_string(),
            files: files
                .iter()
                .map(|(n, c)| (n.to_string(), c.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_run_success() {
        let runner = Arc::new(
            MockRunner::new().with("docker run", MockOutput::stdout("hello world")),
        );
        let out = engine("python", "run", &runner)
            .exec(&request("python", "", &[("", "print('hello world')")]));
        assert_eq!(out.id, "http_42");
        assert!(out.ok);
        assert_eq!(out.stdout, "hello world");
        assert_eq!(out.stderr, "");
        assert!(out.error.is_none());
        assert!(runner.has(&["docker run --rm --name http_42", "codapi/python"]));
        assert!(runner.has(&["python main.py"]));
        assert!(runner.has(&[
            "--runtime runc --cpus 1 --memory 64m --network none --pids-limit 64 --user sandbox --read-only"
        ]));
    }

    #[test]
    fn test_run_custom_version() {
        let runner = Arc::new(MockRunner::new());
        let out = engine("python", "run", &runner)
            .exec(&request("python", "dev", &[("", "print(1)")]));
        assert!(out.ok);
        assert!(runner.has(&["codapi/python:dev"]));
    }

    #[test]
    fn test_run_step_version() {
        let runner = Arc::new(MockRunner::new());
        let out = engine("go", "run", &runner).exec(&request("go", "dev", &[("", "var n = 42")]));
        assert!(out.ok);
        assert!(runner.has(&["codapi/go:dev", "go build"]));
        // `latest` ignores the request version
        assert!(runner.has(&["codapi/alpine ./main"]));
    }

    #[test]
    fn test_run_unsupported_version() {
        let runner = Arc::new(MockRunner::new());
        let out = engine("python", "run", &runner)
            .exec(&request("python", "42", &[("", "print(1)")]));
        assert!(!out.ok);
        assert_eq!(out.stderr, "unknown box python:42");
        assert!(!out.error.unwrap().is_internal());
        assert!(runner.lines().is_empty());
    }

    #[test]
    fn test_run_directory_traversal() {
        let runner = Arc::new(MockRunner::new());
        let name = "../../opt/codapi/codapi";
        let out = engine("python", "run", &runner)
            .exec(&request("python", "", &[("", "print(1)"), (name, "hehe")]));
        assert!(!out.ok);
        assert_eq!(out.stderr, format!("files[{}]: invalid name", name));
        assert!(runner.lines().is_empty());
    }

    #[test]
    fn test_run_mounts_work_dir() {
        let runner = Arc::new(MockRunner::new());
        engine("python", "run", &runner).exec(&request("python", "", &[("", "print(1)")]));
        let line = runner.lines().remove(0);
        let volume = line
            .split(" --volume ")
            .nth(1)
            .and_then(|rest| rest.split(' ').next())
            .unwrap();
        assert!(volume.ends_with(":/sandbox:ro"));
        let dir = volume.trim_end_matches(":/sandbox:ro");
        // removed after the request
        assert!(!Path::new(dir).exists());
    }

    #[test]
    fn test_exec_with_stdin() {
        let runner = Arc::new(
            MockRunner::new().with("docker exec", MockOutput::stdout("hello world")),
        );
        let out = engine("postgresql", "run", &runner)
            .exec(&request("postgresql", "", &[("", "select 'hello world'")]));
        assert!(out.ok);
        assert_eq!(out.stdout, "hello world");
        assert!(runner.has(&["psql -f create.sql"]));
        assert!(runner.has(&["docker exec --interactive --user sandbox postgres psql --user=http_42"]));
        assert!(runner.has(&["psql -f drop.sql"]));

        let calls = runner.calls();
        let stdin: Vec<_> = calls.iter().map(|c| c.stdin.as_deref()).collect();
        assert_eq!(stdin, vec![None, Some("select 'hello world'"), None]);
    }

    #[test]
    fn test_stop() {
        let runner = Arc::new(
            MockRunner::new()
                .with("docker run", MockOutput::stdout("c958ff2"))
                .with("docker exec", MockOutput::stdout("hello"))
                .with("docker stop", MockOutput::stdout("alpine_42")),
        );
        let mut req = request("alpine", "", &[("", "echo hello")]);
        req.id = "alpine_42".to_string();
        req.command = "echo".to_string();
        let out = engine("alpine", "echo", &runner).exec(&req);
        assert!(out.ok);
        assert_eq!(out.stdout, "hello");
        assert_eq!(
            runner.lines()[1..],
            [
                "docker exec --interactive --user sandbox alpine_42 sh main.sh".to_string(),
                "docker stop alpine_42".to_string(),
            ]
        );
        assert!(runner.has(&["docker run --rm --name alpine_42", "--detach"]));
    }

    #[test]
    fn test_before_failure_aborts() {
        let runner = Arc::new(MockRunner::new().with(
            "docker run",
            MockOutput::stderr("no image").exit(MockExit::Failed("exit status 125".into())),
        ));
        let mut req = request("alpine", "", &[("", "echo hello")]);
        req.command = "echo".to_string();
        let out = engine("alpine", "echo", &runner).exec(&req);
        assert!(!out.ok);
        assert_eq!(out.stderr, "no image (exit status 125)");
        assert_eq!(runner.lines().len(), 1);
    }

    #[test]
    fn test_pipeline_stops_at_first_failure() {
        let runner = Arc::new(MockRunner::new().with(
            "docker run",
            MockOutput::stderr("SyntaxError").exit(MockExit::Failed("exit status 1".into())),
        ));
        let out = engine("python", "pipeline", &runner)
            .exec(&request("python", "", &[("", "print(")]));
        assert!(!out.ok);
        assert_eq!(out.stderr, "SyntaxError (exit status 1)");
        assert!(runner.has(&["python build.py"]));
        assert!(!runner.has(&["./main"]));
        // cleanup still runs
        assert!(runner.has(&["docker exec", "cleanup"]));
    }

    #[test]
    fn test_after_failure_overrides_success() {
        let runner = Arc::new(MockRunner::new().with(
            "docker exec",
            MockOutput::stderr("cleanup failed").exit(MockExit::Failed("exit status 2".into())),
        ));
        let out = engine("python", "pipeline", &runner)
            .exec(&request("python", "", &[("", "print(1)")]));
        assert!(!out.ok);
        assert_eq!(out.stderr, "cleanup failed (exit status 2)");
        assert!(runner.has(&["./main"]));
    }

    #[test]
    fn test_user_code_failure_merges_output() {
        let runner = Arc::new(MockRunner::new().with(
            "docker run",
            MockOutput {
                stdout: "partial".into(),
                stderr: "NameError".into(),
                exit: MockExit::Failed("exit status 1".into()),
            },
        ));
        let out = engine("python", "run", &runner)
            .exec(&request("python", "", &[("", "print(x)")]));
        assert!(!out.ok);
        assert_eq!(out.stdout, "");
        assert_eq!(out.stderr, "partial\nNameError (exit status 1)");
        assert!(!out.error.unwrap().is_internal());
    }

    #[test]
    fn test_timeout_kills_container() {
        let runner = Arc::new(
            MockRunner::new().with("docker run", MockOutput::default().exit(MockExit::Killed)),
        );
        let out = engine("python", "run", &runner)
            .exec(&request("python", "", &[("", "while True: pass")]));
        assert!(!out.ok);
        assert_eq!(out.stderr, "code execution timeout");
        assert!(out.error.unwrap().is_timeout());
        assert!(runner.wait_for(&["docker kill http_42"], Duration::from_secs(2)));
    }

    #[test]
    fn test_exec_timeout_does_not_kill() {
        let runner = Arc::new(
            MockRunner::new().with("docker exec", MockOutput::default().exit(MockExit::Killed)),
        );
        let out = engine("postgresql", "run", &runner)
            .exec(&request("postgresql", "", &[("", "select pg_sleep(10)")]));
        assert_eq!(out.stderr, "code execution timeout");
        thread::sleep(Duration::from_millis(50));
        assert!(!runner.has(&["docker kill"]));
    }

    #[test]
    fn test_start_failure_is_internal() {
        let runner = Arc::new(
            MockRunner::new().with("docker run", MockOutput::default().exit(MockExit::NotFound)),
        );
        let out = engine("python", "run", &runner)
            .exec(&request("python", "", &[("", "print(1)")]));
        assert!(!out.ok);
        assert_eq!(out.stderr, "internal error");
        let err = out.error.unwrap();
        assert!(err.is_internal());
        assert!(err.to_string().starts_with("execute code: "));
    }

    #[test]
    fn test_new_rejects_empty_steps() {
        let mut cfg = Config::default();
        cfg.commands.insert(
            "python".to_string(),
            HashMap::from([("run".to_string(), command(None, vec![], None))]),
        );
        let runner: Arc<dyn Runner> = Arc::new(MockRunner::new());
        let err = Docker::new(Arc::new(cfg), "python", "run", runner).err().unwrap();
        assert!(err.to_string().contains("no steps"));
    }

    #[test]
    fn test_any_engine_dispatch() {
        let runner: Arc<dyn Runner> = Arc::new(
            MockRunner::new().with("docker run", MockOutput::stdout("42")),
        );
        let engine = AnyEngine::new(&test_config(), "python", "run", runner).unwrap();
        let out = engine.exec(&request("python", "", &[("", "print(42)")]));
        assert_eq!(out.stdout, "42");
    }

    #[test]
    fn test_box_name() {
        assert_eq!(box_name("python", "", ""), "python");
        assert_eq!(box_name("python", "", "prod"), "python:prod");
        assert_eq!(box_name("python", "dev", "prod"), "python:dev");
        assert_eq!(box_name("python", "latest", "prod"), "python");
    }

    #[test]
    fn test_user_error() {
        assert_eq!(user_error("exit status 1", "", ""), "exit status 1");
        assert_eq!(user_error("exit status 1", "out", ""), "out (exit status 1)");
        assert_eq!(user_error("exit status 1", "", "err"), "err (exit status 1)");
    }

    #[test]
    fn test_run_args_optional_flags() {
        let mut bx = test_box("codapi/python");
        bx.writable = true;
        bx.storage = "16m".to_string();
        bx.tmpfs = Some(vec!["/tmp:rw,size=16m".to_string()]);
        bx.cap_drop = Some(vec!["all".to_string()]);
        bx.ulimit = Some(vec!["nofile=96".to_string()]);
        let mut st = step("python", Action::Run, &["python", "main.py"]);
        st.stdin = true;

        let args = run_args(&bx, &st, "py_1", Path::new("/tmp/box")).join(" ");
        assert!(!args.contains("--read-only"));
        assert!(args.contains("--interactive"));
        assert!(args.contains("--storage-opt size=16m"));
        assert!(args.contains("--volume /tmp/box:/sandbox:ro"));
        assert!(args.contains("--tmpfs /tmp:rw,size=16m"));
        assert!(args.contains("--cap-drop all"));
        assert!(args.contains("--ulimit nofile=96"));
        assert!(args.ends_with("codapi/python"));
    }

    #[test]
    fn test_expand_vars() {
        let name = "codapi_01";
        for (cmd, want) in [
            ("python main.py", "python main.py".to_string()),
            ("sh create.sh :name", format!("sh create.sh {}", name)),
            (
                "sh copy.sh :name new-:name",
                format!("sh copy.sh {} new-{}", name, name),
            ),
            (":name-:name", format!("{}-:name", name)),
        ] {
            let src: Vec<String> = cmd.split(' ').map(String::from).collect();
            assert_eq!(expand_vars(&src, name).join(" "), want, "{}", cmd);
        }
    }
}
