//! Kubernetes manifest generation.
//!
//! Manifests are built as structured values and serialized with serde_yaml,
//! then joined into one multi-document stream with `---` separators. A
//! namespace and configmap are always emitted; deployment, HPA, service and
//! ingress depend on the request's resource tags and parameters.

use serde_json::json;
use tracing::debug;

use smith_intent::{IacFormat, ParamGroupKind, ResolvedRequest};

use crate::error::GenResult;
use crate::generator::{Artifact, ArtifactGenerator};

/// Generates Kubernetes manifests.
#[derive(Debug, Default)]
pub struct KubernetesGenerator;

impl KubernetesGenerator {
    pub fn new() -> Self {
        Self
    }

    fn app_name<'a>(&self, request: &'a ResolvedRequest) -> &'a str {
        request
            .parameters
            .get_str(ParamGroupKind::General, "name")
            .unwrap_or("app")
    }

    fn namespace<'a>(&self, request: &'a ResolvedRequest) -> &'a str {
        request
            .parameters
            .get_str(ParamGroupKind::General, "environment")
            .unwrap_or("default")
    }

    fn ports(&self, request: &ResolvedRequest) -> Vec<i64> {
        request
            .parameters
            .get(ParamGroupKind::Network, "ports")
            .and_then(|v| v.as_int_list())
            .map(|p| p.to_vec())
            .unwrap_or_else(|| vec![80])
    }

    fn namespace_manifest(&self, request: &ResolvedRequest) -> GenResult<String> {
        let namespace = self.namespace(request);
        let manifest = json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": {
                "name": namespace,
                "labels": {
                    "name": namespace,
                    "managed-by": "infrasmith",
                },
            },
        });
        Ok(serde_yaml::to_string(&manifest)?)
    }

    fn deployment_manifest(&self, request: &ResolvedRequest) -> GenResult<String> {
        let params = &request.parameters;
        let app = self.app_name(request);
        let namespace = self.namespace(request);
        let replicas = params.get_int(ParamGroupKind::Scaling, "count").unwrap_or(3);
        let cpu = params.get_int(ParamGroupKind::Compute, "cpu").unwrap_or(1);
        let memory = params
            .get_str(ParamGroupKind::Compute, "memory")
            .unwrap_or("512Mi");
        let ports = self.ports(request);
        let probe_port = ports.first().copied().unwrap_or(80);

        let container_ports: Vec<_> = ports
            .iter()
            .map(|p| json!({"containerPort": p, "protocol": "TCP"}))
            .collect();

        let manifest = json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": format!("{app}-deployment"),
                "namespace": namespace,
                "labels": {"app": app, "managed-by": "infrasmith"},
            },
            "spec": {
                "replicas": replicas,
                "selector": {"matchLabels": {"app": app}},
                "template": {
                    "metadata": {"labels": {"app": app}},
                    "spec": {
                        "securityContext": {
                            "runAsNonRoot": true,
                            "runAsUser": 1000,
                        },
                        "containers": [{
                            "name": app,
                            "image": format!("{app}:latest"),
                            "ports": container_ports,
                            "resources": {
                                "requests": {"cpu": cpu.to_string(), "memory": memory},
                                "limits": {"cpu": (cpu * 2).to_string(), "memory": memory},
                            },
                            "livenessProbe": {
                                "httpGet": {"path": "/health", "port": probe_port},
                                "initialDelaySeconds": 30,
                                "periodSeconds": 10,
                            },
                            "readinessProbe": {
                                "httpGet": {"path": "/ready", "port": probe_port},
                                "initialDelaySeconds": 5,
                                "periodSeconds": 5,
                            },
                            "env": [{"name": "ENVIRONMENT", "value": namespace}],
                            "envFrom": [{"configMapRef": {"name": format!("{app}-config")}}],
                        }],
                    },
                },
            },
        });
        Ok(serde_yaml::to_string(&manifest)?)
    }

    fn hpa_manifest(&self, request: &ResolvedRequest) -> GenResult<String> {
        let params = &request.parameters;
        let app = self.app_name(request);
        let manifest = json!({
            "apiVersion": "autoscaling/v2",
            "kind": "HorizontalPodAutoscaler",
            "metadata": {
                "name": format!("{app}-hpa"),
                "namespace": self.namespace(request),
            },
            "spec": {
                "scaleTargetRef": {
                    "apiVersion": "apps/v1",
                    "kind": "Deployment",
                    "name": format!("{app}-deployment"),
                },
                "minReplicas": params.get_int(ParamGroupKind::Scaling, "min_size").unwrap_or(2),
                "maxReplicas": params.get_int(ParamGroupKind::Scaling, "max_size").unwrap_or(10),
                "metrics": [
                    {
                        "type": "Resource",
                        "resource": {
                            "name": "cpu",
                            "target": {"type": "Utilization", "averageUtilization": 70},
                        },
                    },
                    {
                        "type": "Resource",
                        "resource": {
                            "name": "memory",
                            "target": {"type": "Utilization", "averageUtilization": 80},
                        },
                    },
                ],
            },
        });
        Ok(serde_yaml::to_string(&manifest)?)
    }

    fn service_manifest(&self, request: &ResolvedRequest) -> GenResult<String> {
        let app = self.app_name(request);
        let service_type = if request.parameters.flag(ParamGroupKind::Network, "load_balancer") {
            "LoadBalancer"
        } else {
            "ClusterIP"
        };
        let service_ports: Vec<_> = self
            .ports(request)
            .iter()
            .enumerate()
            .map(|(i, p)| {
                json!({
                    "name": format!("port-{i}"),
                    "port": p,
                    "targetPort": p,
                    "protocol": "TCP",
                })
            })
            .collect();

        let manifest = json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {
                "name": format!("{app}-service"),
                "namespace": self.namespace(request),
                "labels": {"app": app},
            },
            "spec": {
                "type": service_type,
                "selector": {"app": app},
                "ports": service_ports,
            },
        });
        Ok(serde_yaml::to_string(&manifest)?)
    }

    fn configmap_manifest(&self, request: &ResolvedRequest) -> GenResult<String> {
        let app = self.app_name(request);
        let namespace = self.namespace(request);
        let manifest = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": format!("{app}-config"),
                "namespace": namespace,
            },
            "data": {
                "APP_NAME": app,
                "LOG_LEVEL": "info",
                "ENVIRONMENT": namespace,
            },
        });
        Ok(serde_yaml::to_string(&manifest)?)
    }

    fn ingress_manifest(&self, request: &ResolvedRequest) -> GenResult<String> {
        let app = self.app_name(request);
        let host = format!("{app}.example.com");
        let mut manifest = json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {
                "name": format!("{app}-ingress"),
                "namespace": self.namespace(request),
                "annotations": {"kubernetes.io/ingress.class": "nginx"},
            },
            "spec": {
                "rules": [{
                    "host": host,
                    "http": {
                        "paths": [{
                            "path": "/",
                            "pathType": "Prefix",
                            "backend": {
                                "service": {
                                    "name": format!("{app}-service"),
                                    "port": {"number": 80},
                                },
                            },
                        }],
                    },
                }],
            },
        });

        if request.parameters.flag(ParamGroupKind::Security, "ssl_enabled") {
            manifest["spec"]["tls"] = json!([{
                "hosts": [host],
                "secretName": format!("{app}-tls"),
            }]);
        }
        Ok(serde_yaml::to_string(&manifest)?)
    }
}

impl ArtifactGenerator for KubernetesGenerator {
    fn format(&self) -> IacFormat {
        IacFormat::Kubernetes
    }

    fn generate(&self, request: &ResolvedRequest) -> GenResult<Artifact> {
        debug!(action = %request.action, "generating kubernetes manifests");

        let mut docs = vec![self.namespace_manifest(request)?];

        let wants_deployment =
            request.mentions(&["deployment", "pod", "container", "app", "service", "instance"]);
        if wants_deployment {
            docs.push(self.deployment_manifest(request)?);
            // An HPA without its deployment would be a dangling reference.
            if request.parameters.flag(ParamGroupKind::Scaling, "auto_scaling") {
                docs.push(self.hpa_manifest(request)?);
            }
        }

        if request.mentions(&["service", "load_balancer", "deployment", "app"]) {
            docs.push(self.service_manifest(request)?);
        }

        docs.push(self.configmap_manifest(request)?);

        if request.mentions(&["ingress"])
            || request.parameters.flag(ParamGroupKind::Network, "load_balancer")
        {
            docs.push(self.ingress_manifest(request)?);
        }

        Ok(Artifact {
            format: IacFormat::Kubernetes,
            provider: request.provider,
            content: self.merge_documents(docs),
        })
    }

    fn merge_documents(&self, docs: Vec<String>) -> String {
        docs.iter()
            .map(|d| d.trim_end())
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join("\n---\n")
            + "\n"
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
            format: IacFormat::Kubernetes,
            provider: None,
            resources: resources.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            parameters: params,
            confidence: 1.0,
        }
    }

    #[test]
    fn test_deployment_with_requested_replicas() {
        let mut params = ParameterSet::new();
        params.insert(ParamGroupKind::Scaling, "count", ParamValue::Int(3));
        let artifact = KubernetesGenerator::new()
            .generate(&request(&["deployment"], params))
            .unwrap();

        assert!(artifact.content.contains("kind: Deployment"));
        assert!(artifact.content.contains("replicas: 3"));
        assert!(artifact.content.contains("kind: Namespace"));
        assert!(artifact.content.contains("kind: ConfigMap"));
    }

    #[test]
    fn test_replicas_default_to_three() {
        let artifact = KubernetesGenerator::new()
            .generate(&request(&["deployment"], ParameterSet::new()))
            .unwrap();
        assert!(artifact.content.contains("replicas: 3"));
    }

    #[test]
    fn test_hpa_requires_deployment() {
        // auto_scaling set but no deployment-like resource tag: no HPA.
        let mut params = ParameterSet::new();
        params.insert(ParamGroupKind::Scaling, "auto_scaling", ParamValue::Bool(true));
        let artifact = KubernetesGenerator::new()
            .generate(&request(&["volume"], params.clone()))
            .unwrap();
        assert!(!artifact.content.contains("HorizontalPodAutoscaler"));

        let artifact = KubernetesGenerator::new()
            .generate(&request(&["deployment"], params))
            .unwrap();
        assert!(artifact.content.contains("HorizontalPodAutoscaler"));
        assert!(artifact.content.contains("kind: Deployment"));
    }

    #[test]
    fn test_service_type_follows_load_balancer_flag() {
        let mut params = ParameterSet::new();
        params.insert(ParamGroupKind::Network, "load_balancer", ParamValue::Bool(true));
        let artifact = KubernetesGenerator::new()
            .generate(&request(&["service"], params))
            .unwrap();
        assert!(artifact.content.contains("type: LoadBalancer"));
        // load_balancer also pulls in an ingress.
        assert!(artifact.content.contains("kind: Ingress"));

        let artifact = KubernetesGenerator::new()
            .generate(&request(&["service"], ParameterSet::new()))
            .unwrap();
        assert!(artifact.content.contains("type: ClusterIP"));
        assert!(!artifact.content.contains("kind: Ingress"));
    }

    #[test]
    fn test_ingress_tls_only_when_ssl_enabled() {
        let mut params = ParameterSet::new();
        params.insert(ParamGroupKind::Network, "load_balancer", ParamValue::Bool(true));
        params.insert(ParamGroupKind::Security, "ssl_enabled", ParamValue::Bool(true));
        let artifact = KubernetesGenerator::new()
            .generate(&request(&["service"], params))
            .unwrap();
        assert!(artifact.content.contains("tls:"));
        assert!(artifact.content.contains("secretName: app-tls"));
    }

    #[test]
    fn test_documents_are_yaml_separated() {
        let artifact = KubernetesGenerator::new()
            .generate(&request(&["deployment"], ParameterSet::new()))
            .unwrap();
        let docs: Vec<_> = artifact.content.split("\n---\n").collect();
        assert!(docs.len() >= 3);
        for doc in docs {
            let parsed: serde_yaml::Value = serde_yaml::from_str(doc).unwrap();
            assert!(parsed.get("kind").is_some());
        }
    }

    #[test]
    fn test_empty_port_list_falls_back_to_default_probe_port() {
        let mut params = ParameterSet::new();
        params.insert(ParamGroupKind::Network, "ports", ParamValue::IntList(vec![]));
        let artifact = KubernetesGenerator::new()
            .generate(&request(&["deployment"], params))
            .unwrap();
        assert!(artifact.content.contains("port: 80"));
    }

    #[test]
    fn test_custom_name_and_environment_flow_through() {
        let mut params = ParameterSet::new();
        params.insert(ParamGroupKind::General, "name", "billing".into());
        params.insert(ParamGroupKind::General, "environment", "staging".into());
        let artifact = KubernetesGenerator::new()
            .generate(&request(&["deployment"], params))
            .unwrap();
        assert!(artifact.content.contains("name: billing-deployment"));
        assert!(artifact.content.contains("namespace: staging"));
        assert!(artifact.content.contains("name: staging"));
    }
}
