use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::mpsc;

use super::*;
use crate::reload::ReloadMsg;
use crate::transform::font::sample_font;

struct Project {
    dir: TempDir,
    config: Arc<GustConfig>,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = Arc::new(GustConfig::with_root(dir.path()));
        Self { dir, config }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn write(&self, rel: &str, contents: impl AsRef<[u8]>) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn scheduler(&self) -> Arc<Scheduler> {
        let registry = Arc::new(TaskRegistry::from_config(&self.config).unwrap());
        Arc::new(Scheduler::new(
            Arc::clone(&self.config),
            registry,
            Lifecycle::new(),
        ))
    }

    fn scheduler_with_reload(&self) -> (Arc<Scheduler>, mpsc::Receiver<ReloadMsg>) {
        let registry = Arc::new(TaskRegistry::from_config(&self.config).unwrap());
        let (handle, rx) = ReloadHandle::channel();
        let scheduler = Scheduler::new(Arc::clone(&self.config), registry, Lifecycle::new())
            .with_reload_handle(handle);
        (Arc::new(scheduler), rx)
    }

    /// A populated preview directory, as the dev tasks would leave it.
    fn with_dist(self) -> Self {
        self.write("dist/index.html", "<html>\n  <body>\n    <p>hi</p>\n  </body>\n</html>");
        self.write("dist/css/index.css", "a {\n  color: #ff0000;\n}\n");
        self.write("dist/scripts/index.min.js", "const answer = 40 + 2;\nconsole.log(answer);\n");
        self.write("dist/images/a.webp", b"webp");
        self.write("dist/fonts/mono/Fira.woff2", b"woff2");
        self
    }
}

/// Every file under `dir` with its contents, sorted by path.
fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<_> = jwalk::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let path = e.path();
            let contents = fs::read(&path).unwrap();
            (path.strip_prefix(dir).unwrap().to_path_buf(), contents)
        })
        .collect();
    files.sort();
    files
}

fn drain(rx: &mut mpsc::Receiver<ReloadMsg>) -> Vec<ReloadMsg> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

#[tokio::test]
async fn test_build_pipeline() {
    let project = Project::new().with_dist();
    let scheduler = project.scheduler();

    scheduler.run_graph(&TaskGraph::build()).await.unwrap();

    let build = project.path("build");
    let html = fs::read_to_string(build.join("index.html")).unwrap();
    assert_eq!(html, "<html><body><p>hi</p></body></html>");
    let css = fs::read_to_string(build.join("css/index.css")).unwrap();
    assert_eq!(css, "a{color:red}");
    assert!(build.join("scripts/index.min.js").exists());
    assert_eq!(fs::read(build.join("images/a.webp")).unwrap(), b"webp");
    assert_eq!(fs::read(build.join("fonts/mono/Fira.woff2")).unwrap(), b"woff2");
}

#[tokio::test]
async fn test_build_is_idempotent() {
    let project = Project::new().with_dist();
    let scheduler = project.scheduler();

    scheduler.run_graph(&TaskGraph::build()).await.unwrap();
    let first = snapshot(&project.path("build"));
    scheduler.run_graph(&TaskGraph::build()).await.unwrap();
    let second = snapshot(&project.path("build"));

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_sequence_aborts_after_failure() {
    let project = Project::new().with_dist();
    // Not UTF-8: the style minifier rejects it.
    project.write("dist/css/index.css", [0xff, 0xfe, 0x00]);
    let scheduler = project.scheduler();

    let err = scheduler.run_graph(&TaskGraph::build()).await.unwrap_err();

    assert!(matches!(&err, ScheduleError::Task { task, .. } if task == "stylesBuild"));
    assert!(!err.is_fatal());
    // Earlier steps ran, later steps did not.
    assert!(project.path("build/index.html").exists());
    assert!(!project.path("build/scripts").exists());
    assert!(!project.path("build/images").exists());
    assert!(!scheduler.lifecycle().is_shutdown());
}

#[tokio::test]
async fn test_parallel_failure_does_not_cancel_siblings() {
    let project = Project::new();
    project.write("src/images/broken.png", b"not really a png");
    project.write("src/fonts/Fira.ttf", sample_font());
    let scheduler = project.scheduler();

    let group = Node::Parallel(vec![Node::task("images"), Node::task("fonts")]);
    let err = scheduler.run(&group).await.unwrap_err();

    assert!(matches!(&err, ScheduleError::Task { task, .. } if task == "images"));
    assert!(project.path("dist/fonts/Fira.woff").exists());
    assert!(project.path("dist/fonts/Fira.woff2").exists());
}

#[tokio::test]
async fn test_write_failure_is_fatal() {
    let project = Project::new().with_dist();
    // A file where the production directory should be.
    project.write("build", b"in the way");
    let scheduler = project.scheduler();

    let err = scheduler.run_graph(&TaskGraph::build()).await.unwrap_err();

    assert!(err.is_fatal());
    assert!(scheduler.lifecycle().is_shutdown());
}

#[tokio::test]
async fn test_unknown_task_rejected_before_running() {
    let project = Project::new().with_dist();
    let scheduler = project.scheduler();

    let graph = TaskGraph::tasks(&["htmlBuild".into(), "nope".into()]);
    let err = scheduler.run_graph(&graph).await.unwrap_err();

    assert!(matches!(err, ScheduleError::UnknownTask(name) if name == "nope"));
    assert!(!project.path("build").exists());
}

#[tokio::test]
async fn test_style_change_refreshes_css_only() {
    let project = Project::new();
    project.write("src/styles/index.css", "body { color: red }");
    let (scheduler, mut rx) = project.scheduler_with_reload();

    scheduler.rebuild("styles").await.unwrap();

    let messages = drain(&mut rx);
    assert_eq!(messages.len(), 1);
    match &messages[0] {
        ReloadMsg::Css { paths } => assert_eq!(paths, &["/css/index.css".to_string()]),
        other => panic!("expected css refresh, got {other:?}"),
    }
}

#[tokio::test]
async fn test_html_change_reloads_page() {
    let project = Project::new();
    project.write("src/index.html", "<p>hi</p>");
    let (scheduler, mut rx) = project.scheduler_with_reload();

    scheduler.rebuild("html").await.unwrap();

    let messages = drain(&mut rx);
    assert!(matches!(
        messages.as_slice(),
        [ReloadMsg::Reload { reason: Some(reason) }] if reason == "html"
    ));
}

#[tokio::test]
async fn test_error_overlay_lifecycle() {
    let project = Project::new();
    project.write("src/index.html", "<p>unterminated <!-- comment");
    let (scheduler, mut rx) = project.scheduler_with_reload();

    assert!(scheduler.rebuild("html").await.is_err());
    let messages = drain(&mut rx);
    assert!(matches!(
        messages.as_slice(),
        [ReloadMsg::Error { task, message }] if task == "html" && message.contains("minify-html")
    ));

    project.write("src/index.html", "<p>fixed</p>");
    scheduler.rebuild("html").await.unwrap();
    let messages = drain(&mut rx);
    assert!(matches!(
        messages.as_slice(),
        [ReloadMsg::ClearError, ReloadMsg::Reload { .. }]
    ));
}

#[tokio::test]
async fn test_nothing_written_sends_nothing() {
    let project = Project::new();
    project.write("src/fonts/Fira.ttf", sample_font());
    let (scheduler, mut rx) = project.scheduler_with_reload();

    scheduler.rebuild("fonts").await.unwrap();
    assert_eq!(drain(&mut rx).len(), 1);

    // Artifacts are fresh now; the staleness filter skips both formats.
    let report = scheduler.rebuild("fonts").await.unwrap();
    assert!(report.written.is_empty());
    assert!(drain(&mut rx).is_empty());
}
