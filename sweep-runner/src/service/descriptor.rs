//! Job descriptor builder
//!
//! Renders one self-contained batch script per (model, task) pair and writes
//! it to the jobs directory. The script records a failure marker itself when
//! the evaluation exits non-zero, so failures are visible after the launcher
//! has exited.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use sweep_core::domain::job::JobDescriptor;
use sweep_core::domain::tier::{ResourceTier, TierPolicy, TierTemplate};
use sweep_core::domain::work::sanitize_model_id;
use tracing::debug;

/// Extension of rendered job scripts
pub const SCRIPT_EXTENSION: &str = "sh";

/// Renders and writes job scripts
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    jobs_dir: PathBuf,
    failures_dir: PathBuf,
    runner_command: String,
    policy: TierPolicy,
}

impl DescriptorBuilder {
    /// Creates a new builder
    ///
    /// # Arguments
    /// * `jobs_dir` - Directory scripts are written to
    /// * `failures_dir` - Directory failed runs write their marker files to
    /// * `runner_command` - Command that runs one evaluation (e.g. "mteb run")
    /// * `policy` - Templates for each resource tier
    pub fn new(
        jobs_dir: impl Into<PathBuf>,
        failures_dir: impl Into<PathBuf>,
        runner_command: impl Into<String>,
        policy: TierPolicy,
    ) -> Self {
        Self {
            jobs_dir: jobs_dir.into(),
            failures_dir: failures_dir.into(),
            runner_command: runner_command.into(),
            policy,
        }
    }

    /// Path of the script for a (model, task) pair
    pub fn script_path(&self, canonical_id: &str, task: &str) -> PathBuf {
        self.jobs_dir.join(format!(
            "{}_{}.{}",
            sanitize_model_id(canonical_id),
            task,
            SCRIPT_EXTENSION
        ))
    }

    /// Path of the failure marker file for a (model, task) pair
    pub fn failure_marker_path(&self, canonical_id: &str, task: &str) -> PathBuf {
        self.failures_dir
            .join(format!("{}_{}.txt", sanitize_model_id(canonical_id), task))
    }

    /// Renders the script contents without touching the filesystem
    pub fn render(
        &self,
        canonical_id: &str,
        task: &str,
        output_folder: &Path,
        template: &TierTemplate,
    ) -> String {
        let run = format!(
            "{} -m {} -t {} --output_folder {} --co2_tracker {} --batch_size {}",
            self.runner_command.trim(),
            shell_quote(canonical_id),
            shell_quote(task),
            shell_quote(&output_folder.to_string_lossy()),
            template.co2_tracker,
            template.batch_size,
        );

        let on_failure = format!(
            "(mkdir -p {} && echo {} >> {})",
            shell_quote(&self.failures_dir.to_string_lossy()),
            shell_quote(&format!("{}_{}", canonical_id, task)),
            shell_quote(&self.failure_marker_path(canonical_id, task).to_string_lossy()),
        );

        format!("{}\n{} || {}\n", template.prelude.trim_end(), run, on_failure)
    }

    /// Renders the script for the given tier and writes it
    ///
    /// An existing script at the same path is overwritten, so building the same
    /// inputs twice leaves identical content.
    pub fn build(
        &self,
        canonical_id: &str,
        task: &str,
        output_folder: &Path,
        tier: ResourceTier,
    ) -> Result<JobDescriptor> {
        let contents = self.render(canonical_id, task, output_folder, self.policy.template(tier));
        let script_path = self.script_path(canonical_id, task);

        std::fs::create_dir_all(&self.jobs_dir).with_context(|| {
            format!("Failed to create jobs directory {}", self.jobs_dir.display())
        })?;
        std::fs::write(&script_path, contents)
            .with_context(|| format!("Failed to write job script {}", script_path.display()))?;

        debug!("Wrote {} ({} tier)", script_path.display(), tier);

        Ok(JobDescriptor {
            canonical_id: canonical_id.to_string(),
            task: task.to_string(),
            output_folder: output_folder.to_path_buf(),
            tier,
            script_path,
        })
    }
}

/// Quotes a word for a POSIX shell, leaving plain words untouched
fn shell_quote(word: &str) -> String {
    if word.is_empty() {
        return "''".to_string();
    }
    if word
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_./:@+=,".contains(c))
    {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(dir: &Path) -> DescriptorBuilder {
        DescriptorBuilder::new(
            dir.join("jobs"),
            "/data/failures",
            "mteb run",
            TierPolicy::default(),
        )
    }

    #[test]
    fn test_script_path_sanitizes_model_id() {
        let builder = builder(Path::new("/tmp/sweep"));
        assert_eq!(
            builder.script_path("GritLM/GritLM-7B", "STS12"),
            PathBuf::from("/tmp/sweep/jobs/GritLM__GritLM-7B_STS12.sh")
        );
    }

    #[test]
    fn test_render_command_and_failure_clause() {
        let builder = builder(Path::new("/tmp/sweep"));
        let template = TierTemplate {
            prelude: "#!/bin/bash\n#SBATCH --gres=gpu:1\n".to_string(),
            batch_size: 4,
            co2_tracker: true,
        };

        let script = builder.render(
            "GritLM/GritLM-7B",
            "STS12",
            Path::new("/data/results"),
            &template,
        );

        assert_eq!(
            script,
            "#!/bin/bash\n#SBATCH --gres=gpu:1\n\
             mteb run -m GritLM/GritLM-7B -t STS12 --output_folder /data/results --co2_tracker true --batch_size 4 \
             || (mkdir -p /data/failures && echo GritLM/GritLM-7B_STS12 >> /data/failures/GritLM__GritLM-7B_STS12.txt)\n"
        );
    }

    #[test]
    fn test_render_quotes_unsafe_words() {
        let builder = DescriptorBuilder::new(
            "/tmp/jobs",
            "/my data/failures",
            "mteb run",
            TierPolicy::default(),
        );
        let template = TierTemplate {
            prelude: "#!/bin/bash".to_string(),
            batch_size: 4,
            co2_tracker: true,
        };

        let script = builder.render("org/it's", "STS 12", Path::new("/my data/results"), &template);

        assert!(script.contains("-m 'org/it'\\''s' -t 'STS 12' --output_folder '/my data/results' "));
        assert!(script.contains("mkdir -p '/my data/failures' && echo 'org/it'\\''s_STS 12' >> "));
        assert!(script.contains(">> '/my data/failures/org__it'\\''s_STS 12.txt')"));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("GritLM/GritLM-7B"), "GritLM/GritLM-7B");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn test_render_uses_tier_options() {
        let builder = builder(Path::new("/tmp/sweep"));
        let template = TierTemplate {
            prelude: "#!/bin/bash".to_string(),
            batch_size: 64,
            co2_tracker: false,
        };

        let script = builder.render("org/m", "T", Path::new("/r"), &template);
        assert!(script.contains("--co2_tracker false --batch_size 64"));
    }

    #[test]
    fn test_build_writes_script_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(dir.path());

        let first = builder
            .build("GritLM/GritLM-7B", "MSMARCO", Path::new("/r"), ResourceTier::HighCapacity)
            .unwrap();
        let first_contents = std::fs::read(&first.script_path).unwrap();

        let second = builder
            .build("GritLM/GritLM-7B", "MSMARCO", Path::new("/r"), ResourceTier::HighCapacity)
            .unwrap();
        let second_contents = std::fs::read(&second.script_path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_contents, second_contents);
        assert!(String::from_utf8(first_contents).unwrap().contains("gpu:8"));
    }

    #[test]
    fn test_build_overwrites_existing_script() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(dir.path());

        let path = builder.script_path("org/m", "T");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale contents that are much longer than nothing").unwrap();

        builder
            .build("org/m", "T", Path::new("/r"), ResourceTier::Standard)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("#!/bin/bash"));
        assert!(!contents.contains("stale"));
    }
}
