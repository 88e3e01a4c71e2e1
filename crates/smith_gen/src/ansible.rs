//! Ansible playbook generation.
//!
//! One play targeting all hosts with become, vars from the general group,
//! and task lists appended per resource family. System setup tasks are
//! always present; application, database and webserver tasks depend on the
//! request's resource tags.

use serde_json::{json, Value};
use tracing::debug;

use smith_intent::{IacFormat, ParamGroupKind, ResolvedRequest};

use crate::error::GenResult;
use crate::generator::{Artifact, ArtifactGenerator};

/// Generates Ansible playbooks.
#[derive(Debug, Default)]
pub struct AnsibleGenerator;

impl AnsibleGenerator {
    pub fn new() -> Self {
        Self
    }

    fn vars(&self, request: &ResolvedRequest) -> Value {
        let params = &request.parameters;
        json!({
            "app_name": params.get_str(ParamGroupKind::General, "name").unwrap_or("app"),
            "environment": params
                .get_str(ParamGroupKind::General, "environment")
                .unwrap_or("production"),
            "app_user": "appuser",
            "app_dir": "/opt/app",
        })
    }

    fn system_tasks(&self) -> Vec<Value> {
        vec![
            json!({
                "name": "Update apt cache",
                "apt": {"update_cache": true, "cache_valid_time": 3600},
                "when": "ansible_os_family == 'Debian'",
            }),
            json!({
                "name": "Install required packages",
                "apt": {
                    "name": ["curl", "git", "build-essential"],
                    "state": "present",
                },
                "when": "ansible_os_family == 'Debian'",
            }),
            json!({
                "name": "Create application user",
                "user": {
                    "name": "{{ app_user }}",
                    "state": "present",
                    "shell": "/bin/bash",
                    "create_home": true,
                },
            }),
            json!({
                "name": "Create application directory",
                "file": {
                    "path": "{{ app_dir }}",
                    "state": "directory",
                    "owner": "{{ app_user }}",
                    "group": "{{ app_user }}",
                    "mode": "0755",
                },
            }),
        ]
    }

    fn application_tasks(&self) -> Vec<Value> {
        vec![
            json!({
                "name": "Clone application repository",
                "git": {
                    "repo": "https://github.com/example/app.git",
                    "dest": "{{ app_dir }}/source",
                    "version": "main",
                },
                "become_user": "{{ app_user }}",
            }),
            json!({
                "name": "Copy application configuration",
                "template": {
                    "src": "app.conf.j2",
                    "dest": "{{ app_dir }}/config/app.conf",
                    "owner": "{{ app_user }}",
                    "group": "{{ app_user }}",
                    "mode": "0644",
                },
            }),
            json!({
                "name": "Create systemd service",
                "template": {
                    "src": "app.service.j2",
                    "dest": "/etc/systemd/system/{{ app_name }}.service",
                    "mode": "0644",
                },
                "notify": "Restart application",
            }),
            json!({
                "name": "Enable and start application service",
                "systemd": {
                    "name": "{{ app_name }}",
                    "enabled": true,
                    "state": "started",
                    "daemon_reload": true,
                },
            }),
        ]
    }

    fn database_tasks(&self) -> Vec<Value> {
        vec![
            json!({
                "name": "Install PostgreSQL",
                "apt": {
                    "name": ["postgresql", "postgresql-contrib", "python3-psycopg2"],
                    "state": "present",
                },
            }),
            json!({
                "name": "Ensure PostgreSQL is running",
                "systemd": {"name": "postgresql", "state": "started", "enabled": true},
            }),
            json!({
                "name": "Create database",
                "postgresql_db": {"name": "{{ app_name }}_db", "state": "present"},
                "become_user": "postgres",
            }),
            json!({
                "name": "Create database user",
                "postgresql_user": {
                    "name": "{{ app_name }}_user",
                    "password": "{{ db_password }}",
                    "db": "{{ app_name }}_db",
                    "priv": "ALL",
                    "state": "present",
                },
                "become_user": "postgres",
            }),
        ]
    }

    fn webserver_tasks(&self, request: &ResolvedRequest) -> Vec<Value> {
        let mut tasks = vec![
            json!({
                "name": "Install Nginx",
                "apt": {"name": "nginx", "state": "present"},
            }),
            json!({
                "name": "Remove default Nginx site",
                "file": {"path": "/etc/nginx/sites-enabled/default", "state": "absent"},
            }),
            json!({
                "name": "Copy Nginx configuration",
                "template": {
                    "src": "nginx.conf.j2",
                    "dest": "/etc/nginx/sites-available/{{ app_name }}",
                    "mode": "0644",
                },
                "notify": "Reload Nginx",
            }),
            json!({
                "name": "Enable Nginx site",
                "file": {
                    "src": "/etc/nginx/sites-available/{{ app_name }}",
                    "dest": "/etc/nginx/sites-enabled/{{ app_name }}",
                    "state": "link",
                },
            }),
            json!({
                "name": "Ensure Nginx is running",
                "systemd": {"name": "nginx", "state": "started", "enabled": true},
            }),
        ];

        if request.parameters.flag(ParamGroupKind::Security, "ssl_enabled") {
            tasks.push(json!({
                "name": "Install Certbot",
                "apt": {
                    "name": ["certbot", "python3-certbot-nginx"],
                    "state": "present",
                },
            }));
            tasks.push(json!({
                "name": "Obtain SSL certificate",
                "command": "certbot --nginx -d {{ app_name }}.example.com --non-interactive --agree-tos -m admin@example.com",
                "args": {
                    "creates": "/etc/letsencrypt/live/{{ app_name }}.example.com/fullchain.pem",
                },
            }));
        }

        tasks
    }

    fn tasks(&self, request: &ResolvedRequest) -> Vec<Value> {
        let mut tasks = self.system_tasks();
        if request.mentions(&["app", "application", "service", "instance"]) {
            tasks.extend(self.application_tasks());
        }
        if request.mentions(&["database"]) {
            tasks.extend(self.database_tasks());
        }
        if request.mentions(&["web", "nginx", "load_balancer"]) {
            tasks.extend(self.webserver_tasks(request));
        }
        tasks
    }
}

impl ArtifactGenerator for AnsibleGenerator {
    fn format(&self) -> IacFormat {
        IacFormat::Ansible
    }

    fn generate(&self, request: &ResolvedRequest) -> GenResult<Artifact> {
        debug!(action = %request.action, "generating ansible playbook");

        let playbook = json!([{
            "name": "InfraSmith generated playbook",
            "hosts": "all",
            "become": true,
            "vars": self.vars(request),
            "tasks": self.tasks(request),
        }]);

        let content = self.merge_documents(vec![serde_yaml::to_string(&playbook)?]);
        Ok(Artifact {
            format: IacFormat::Ansible,
            provider: request.provider,
            content,
        })
    }

    fn merge_documents(&self, docs: Vec<String>) -> String {
        let mut merged = docs
            .iter()
            .map(|d| d.trim_end())
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join("\n---\n");
        if !merged.ends_with('\n') {
            merged.push('\n');
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smith_intent::{Action, ParamValue, ParameterSet};
    use std::collections::BTreeSet;

    fn request(resources: &[&str], params: ParameterSet) -> ResolvedRequest {
        ResolvedRequest {
            action: Action::Create,
            format: IacFormat::Ansible,
            provider: None,
            resources: resources.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            parameters: params,
            confidence: 1.0,
        }
    }

    #[test]
    fn test_playbook_always_has_system_tasks() {
        let artifact = AnsibleGenerator::new()
            .generate(&request(&[], ParameterSet::new()))
            .unwrap();
        assert!(artifact.content.contains("hosts: all"));
        assert!(artifact.content.contains("become: true"));
        assert!(artifact.content.contains("Update apt cache"));
        assert!(artifact.content.contains("Create application user"));
        assert!(!artifact.content.contains("Install PostgreSQL"));
    }

    #[test]
    fn test_database_tag_adds_postgres_tasks() {
        let artifact = AnsibleGenerator::new()
            .generate(&request(&["database"], ParameterSet::new()))
            .unwrap();
        assert!(artifact.content.contains("Install PostgreSQL"));
        assert!(artifact.content.contains("postgresql_db"));
    }

    #[test]
    fn test_ssl_adds_certbot_tasks() {
        let mut params = ParameterSet::new();
        params.insert(ParamGroupKind::Security, "ssl_enabled", ParamValue::Bool(true));
        let artifact = AnsibleGenerator::new()
            .generate(&request(&["web"], params))
            .unwrap();
        assert!(artifact.content.contains("Install Nginx"));
        assert!(artifact.content.contains("Install Certbot"));
        assert!(artifact.content.contains("Obtain SSL certificate"));
    }

    #[test]
    fn test_no_certbot_without_ssl() {
        let artifact = AnsibleGenerator::new()
            .generate(&request(&["web"], ParameterSet::new()))
            .unwrap();
        assert!(artifact.content.contains("Install Nginx"));
        assert!(!artifact.content.contains("Certbot"));
    }

    #[test]
    fn test_vars_follow_general_parameters() {
        let mut params = ParameterSet::new();
        params.insert(ParamGroupKind::General, "name", "billing".into());
        params.insert(ParamGroupKind::General, "environment", "staging".into());
        let artifact = AnsibleGenerator::new()
            .generate(&request(&["service"], params))
            .unwrap();
        assert!(artifact.content.contains("app_name: billing"));
        assert!(artifact.content.contains("environment: staging"));
    }

    #[test]
    fn test_output_is_parseable_yaml() {
        let artifact = AnsibleGenerator::new()
            .generate(&request(&["service", "database"], ParameterSet::new()))
            .unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&artifact.content).unwrap();
        assert!(parsed.as_sequence().is_some());
    }
}
