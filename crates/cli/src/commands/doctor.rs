use deckhand_actions::{S3ObjectStore, SnsNotifier};
use deckhand_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('"', "\\\"")
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_aws_credentials(&config));
            checks.push(check_storage_readiness(&config));
            checks.push(check_notify_readiness(&config));
            checks.push(check_agent_readiness(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in
                ["aws_credentials", "storage_readiness", "notify_readiness", "agent_readiness"]
            {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let skipped = checks.iter().filter(|check| check.status == CheckStatus::Skipped).count();
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = match (any_failed, skipped) {
        (true, _) => "doctor: one or more readiness checks failed".to_string(),
        (false, 0) => "doctor: all readiness checks passed".to_string(),
        (false, skipped) => format!("doctor: readiness checks passed ({skipped} skipped)"),
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_aws_credentials(config: &AppConfig) -> DoctorCheck {
    let has_key = !config.aws.access_key_id.is_empty();
    let has_secret = !config.aws.secret_access_key.expose_secret().is_empty();
    if has_key && has_secret {
        DoctorCheck {
            name: "aws_credentials",
            status: CheckStatus::Pass,
            details: "access key id and secret access key are set".to_string(),
        }
    } else {
        DoctorCheck {
            name: "aws_credentials",
            status: CheckStatus::Fail,
            details: "set aws.access_key_id and aws.secret_access_key (or AWS_* env vars)"
                .to_string(),
        }
    }
}

fn check_storage_readiness(config: &AppConfig) -> DoctorCheck {
    match S3ObjectStore::from_config(&config.aws, &config.storage) {
        Ok(_) => DoctorCheck {
            name: "storage_readiness",
            status: CheckStatus::Pass,
            details: format!("bucket `{}` is configured", config.storage.bucket),
        },
        Err(error) => DoctorCheck {
            name: "storage_readiness",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_notify_readiness(config: &AppConfig) -> DoctorCheck {
    match SnsNotifier::from_config(&config.aws, &config.notify) {
        Ok(_) => DoctorCheck {
            name: "notify_readiness",
            status: CheckStatus::Pass,
            details: format!("topic `{}` is configured", config.notify.topic_arn),
        },
        Err(error) => DoctorCheck {
            name: "notify_readiness",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_agent_readiness(config: &AppConfig) -> DoctorCheck {
    let has_id = !config.agent.agent_id.is_empty();
    let has_alias = !config.agent.agent_alias_id.is_empty();
    match (has_id, has_alias) {
        (true, true) => DoctorCheck {
            name: "agent_readiness",
            status: CheckStatus::Pass,
            details: "agent id and alias id are set".to_string(),
        },
        (false, false) => DoctorCheck {
            name: "agent_readiness",
            status: CheckStatus::Skipped,
            details: "chat disabled; set agent.agent_id and agent.agent_alias_id to enable"
                .to_string(),
        },
        _ => DoctorCheck {
            name: "agent_readiness",
            status: CheckStatus::Fail,
            details: "agent.agent_id and agent.agent_alias_id must be set together".to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];
    for check in &report.checks {
        let status = match check.status {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("  [{status}] {} - {}", check.name, check.details));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use deckhand_core::config::AppConfig;

    use super::{check_agent_readiness, check_aws_credentials, CheckStatus};

    #[test]
    fn missing_credentials_fail_the_credentials_check() {
        let config = AppConfig::default();

        assert_eq!(check_aws_credentials(&config).status, CheckStatus::Fail);
    }

    #[test]
    fn unconfigured_agent_is_skipped_not_failed() {
        let config = AppConfig::default();

        assert_eq!(check_agent_readiness(&config).status, CheckStatus::Skipped);
    }

    #[test]
    fn half_configured_agent_fails() {
        let mut config = AppConfig::default();
        config.agent.agent_id = "AGENT123".to_string();

        assert_eq!(check_agent_readiness(&config).status, CheckStatus::Fail);
    }
}
