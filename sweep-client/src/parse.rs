//! Parsers for Slurm command output

use sweep_core::domain::job::JobId;

/// Header label printed by `squeue` for the job id column
const JOB_ID_HEADER: &str = "JOBID";

/// Parses the output of `squeue --format=%A` into job ids
///
/// Blank lines and header rows are dropped, with or without `--noheader`.
pub fn parse_job_ids(output: &str) -> Vec<JobId> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|tok| !tok.eq_ignore_ascii_case(JOB_ID_HEADER))
        .map(JobId::from)
        .collect()
}

/// Extracts the `Command=` value from `scontrol show jobid` output
///
/// Only the first `=` separates key and value, so commands containing `=`
/// survive intact.
pub fn parse_command_field(description: &str) -> Option<String> {
    description
        .lines()
        .map(str::trim_start)
        .find_map(|line| line.strip_prefix("Command="))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty() && value != "(null)")
}

/// Extracts the job id from `sbatch` output
///
/// Accepts the default `Submitted batch job 12345` form and the
/// `--parsable` form `12345` or `12345;cluster`.
pub fn parse_submitted_job_id(output: &str) -> Option<JobId> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;

    let candidate = match line.strip_prefix("Submitted batch job") {
        Some(rest) => rest.split_whitespace().next()?,
        None => line.split(';').next()?.trim(),
    };

    candidate
        .chars()
        .all(|c| c.is_ascii_digit())
        .then(|| JobId::from(candidate))
        .filter(|_| !candidate.is_empty())
}
