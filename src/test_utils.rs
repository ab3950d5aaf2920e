//! Test utilities and global setup
//!
//! Provides centralized test logging configuration and on-disk workspace
//! fixtures.

/// Test logging utilities
#[cfg(all(test, feature = "test-logging"))]
pub mod logging {
    use std::sync::Once;
    use tracing_subscriber::{EnvFilter, fmt};

    static INIT: Once = Once::new();

    /// Initialize test logging globally - safe to call multiple times
    ///
    /// Respects `RUST_LOG`, defaulting to debug for this crate and info for
    /// the HTTP stack. Uses the test writer so output is captured per test.
    ///
    /// For automatic initialization in a test module:
    /// ```rust
    /// #[cfg(feature = "test-logging")]
    /// #[ctor::ctor]
    /// fn init_test_logging() {
    ///     crate::test_utils::logging::init();
    /// }
    /// ```
    ///
    /// ```bash
    /// RUST_LOG=funcpeek::finder=trace cargo test --features test-logging
    /// ```
    pub fn init() {
        INIT.call_once(|| {
            let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("funcpeek=debug,reqwest=info,hyper=info,hyper_util=info")
            });

            fmt()
                .with_env_filter(env_filter)
                .with_test_writer()
                .with_target(true)
                .with_thread_ids(true)
                .compact()
                .try_init()
                .ok();
        });
    }
}

/// Workspace fixtures backed by a temporary directory
#[cfg(test)]
pub mod workspace {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Temporary source tree, removed on drop
    pub struct TestWorkspace {
        _temp_dir: TempDir,
        pub root: PathBuf,
    }

    impl TestWorkspace {
        pub fn new() -> Result<Self, std::io::Error> {
            let temp_dir = TempDir::new()?;
            let root = temp_dir.path().to_path_buf();
            Ok(Self {
                _temp_dir: temp_dir,
                root,
            })
        }

        /// Write `content` to `relative`, creating parent directories
        pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf, std::io::Error> {
            let path = self.root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
            Ok(path)
        }

        pub fn path(&self) -> &Path {
            &self.root
        }
    }

    /// Small TypeScript project: a definition, two callers and an ignored build dir
    pub fn math_project() -> Result<TestWorkspace, std::io::Error> {
        let workspace = TestWorkspace::new()?;
        workspace.write(
            "src/math.ts",
            "export function add(a: number, b: number): number {\n  return a + b;\n}\n",
        )?;
        workspace.write(
            "src/report.ts",
            "import { add } from './math';\n\
             \n\
             export function report(values: number[]) {\n\
             \x20 const total = add(values[0], values[1]);\n\
             \x20 console.log(total);\n\
             \x20 return total;\n\
             }\n",
        )?;
        workspace.write(
            "src/app.js",
            "const { add } = require('./math');\nconsole.log(add(1, 2));\n",
        )?;
        workspace.write("dist/bundle.js", "add(3, 4);\n")?;
        Ok(workspace)
    }
}
