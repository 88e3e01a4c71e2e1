//! Terraform artifact generation.
//!
//! Emits a single HCL document: provider configuration, variables, resource
//! blocks selected by the request's resource tags, and outputs for every
//! emitted resource. Sections are joined by blank lines.

use tracing::debug;

use smith_intent::{CloudProvider, IacFormat, ParamGroupKind, ResolvedRequest};

use crate::error::GenResult;
use crate::generator::{Artifact, ArtifactGenerator};

/// Generates Terraform configurations.
#[derive(Debug, Default)]
pub struct TerraformGenerator;

impl TerraformGenerator {
    pub fn new() -> Self {
        Self
    }

    fn provider_block(&self, provider: CloudProvider) -> String {
        match provider {
            CloudProvider::Aws => r#"terraform {
  required_version = ">= 1.0"

  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 5.0"
    }
  }
}

provider "aws" {
  region = var.aws_region

  default_tags {
    tags = {
      ManagedBy   = "InfraSmith"
      Environment = var.environment
    }
  }
}"#
            .to_string(),
            CloudProvider::Azure => r#"terraform {
  required_version = ">= 1.0"

  required_providers {
    azurerm = {
      source  = "hashicorp/azurerm"
      version = "~> 3.0"
    }
  }
}

provider "azurerm" {
  features {}
}"#
            .to_string(),
            CloudProvider::Gcp => r#"terraform {
  required_version = ">= 1.0"

  required_providers {
    google = {
      source  = "hashicorp/google"
      version = "~> 5.0"
    }
  }
}

provider "google" {
  project = var.project_id
  region  = var.region
}"#
            .to_string(),
        }
    }

    fn variables(&self, request: &ResolvedRequest) -> String {
        let environment = request
            .parameters
            .get_str(ParamGroupKind::General, "environment")
            .unwrap_or("production");
        let region = request
            .parameters
            .get_str(ParamGroupKind::General, "region")
            .unwrap_or("us-east-1");

        let vars: [(&str, &str, &str); 3] = [
            ("name_prefix", "Prefix for resource names", "infrasmith"),
            ("environment", "Environment name", environment),
            ("aws_region", "AWS region", region),
        ];

        vars.iter()
            .map(|(name, description, default)| {
                format!(
                    r#"variable "{name}" {{
  description = "{description}"
  type        = string
  default     = "{default}"
}}"#
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn compute_block(&self, request: &ResolvedRequest) -> String {
        let params = &request.parameters;
        let instance_type = params
            .get_str(ParamGroupKind::Compute, "instance_type")
            .unwrap_or("t3.micro");
        let count = params.get_int(ParamGroupKind::Scaling, "count").unwrap_or(1);

        if params.flag(ParamGroupKind::Scaling, "auto_scaling") || count > 1 {
            let min_size = params.get_int(ParamGroupKind::Scaling, "min_size").unwrap_or(1);
            let max_size = params.get_int(ParamGroupKind::Scaling, "max_size").unwrap_or(3);
            let desired = if count > 1 { count } else { 2 };
            format!(
                r#"# Launch Template
resource "aws_launch_template" "main" {{
  name_prefix   = "${{var.name_prefix}}-"
  image_id      = data.aws_ami.ubuntu.id
  instance_type = "{instance_type}"

  vpc_security_group_ids = [aws_security_group.main.id]

  tag_specifications {{
    resource_type = "instance"
    tags = {{
      Name = "${{var.name_prefix}}-instance"
    }}
  }}
}}

# Auto Scaling Group
resource "aws_autoscaling_group" "main" {{
  name                = "${{var.name_prefix}}-asg"
  vpc_zone_identifier = var.subnet_ids
  health_check_type   = "EC2"

  min_size         = {min_size}
  max_size         = {max_size}
  desired_capacity = {desired}

  launch_template {{
    id      = aws_launch_template.main.id
    version = "$Latest"
  }}

  tag {{
    key                 = "Name"
    value               = "${{var.name_prefix}}-instance"
    propagate_at_launch = true
  }}
}}

{}"#,
                self.instance_security_group()
            )
        } else {
            format!(
                r#"# EC2 Instance
resource "aws_instance" "main" {{
  ami           = data.aws_ami.ubuntu.id
  instance_type = "{instance_type}"

  subnet_id              = var.subnet_id
  vpc_security_group_ids = [aws_security_group.main.id]

  tags = {{
    Name = "${{var.name_prefix}}-instance"
  }}
}}

{}"#,
                self.instance_security_group()
            )
        }
    }

    fn instance_security_group(&self) -> String {
        r#"# Security Group
resource "aws_security_group" "main" {
  name        = "${var.name_prefix}-sg"
  description = "Security group for ${var.name_prefix}"
  vpc_id      = var.vpc_id

  ingress {
    from_port   = 80
    to_port     = 80
    protocol    = "tcp"
    cidr_blocks = ["0.0.0.0/0"]
  }

  ingress {
    from_port   = 443
    to_port     = 443
    protocol    = "tcp"
    cidr_blocks = ["0.0.0.0/0"]
  }

  egress {
    from_port   = 0
    to_port     = 0
    protocol    = "-1"
    cidr_blocks = ["0.0.0.0/0"]
  }

  tags = {
    Name = "${var.name_prefix}-sg"
  }
}

# Data source for Ubuntu AMI
data "aws_ami" "ubuntu" {
  most_recent = true
  owners      = ["099720109477"] # Canonical

  filter {
    name   = "name"
    values = ["ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server-*"]
  }
}"#
        .to_string()
    }

    fn storage_block(&self, request: &ResolvedRequest) -> String {
        let params = &request.parameters;
        let versioning = params.flag(ParamGroupKind::Storage, "versioning_enabled");
        let encryption = params
            .get_bool(ParamGroupKind::Storage, "encryption_enabled")
            .unwrap_or(true);

        let mut blocks = vec![
            r#"# S3 Bucket
resource "aws_s3_bucket" "main" {
  bucket = "${var.name_prefix}-bucket"

  tags = {
    Name = "${var.name_prefix}-bucket"
  }
}"#
            .to_string(),
            format!(
                r#"resource "aws_s3_bucket_versioning" "main" {{
  bucket = aws_s3_bucket.main.id

  versioning_configuration {{
    status = "{}"
  }}
}}"#,
                if versioning { "Enabled" } else { "Disabled" }
            ),
        ];

        if encryption {
            blocks.push(
                r#"resource "aws_s3_bucket_server_side_encryption_configuration" "main" {
  bucket = aws_s3_bucket.main.id

  rule {
    apply_server_side_encryption_by_default {
      sse_algorithm = "AES256"
    }
  }
}"#
                .to_string(),
            );
        }

        blocks.push(
            r#"resource "aws_s3_bucket_public_access_block" "main" {
  bucket = aws_s3_bucket.main.id

  block_public_acls       = true
  block_public_policy     = true
  ignore_public_acls      = true
  restrict_public_buckets = true
}"#
            .to_string(),
        );

        blocks.join("\n\n")
    }

    fn database_block(&self, request: &ResolvedRequest) -> String {
        let multi_az = request.parameters.flag(ParamGroupKind::Scaling, "multi_az");
        format!(
            r#"# RDS Database
resource "aws_db_instance" "main" {{
  identifier     = "${{var.name_prefix}}-db"
  engine         = "postgres"
  engine_version = "15.3"
  instance_class = "db.t3.micro"

  allocated_storage     = 20
  max_allocated_storage = 100
  storage_encrypted     = true

  db_name  = var.database_name
  username = var.database_username
  password = var.database_password

  multi_az               = {multi_az}
  db_subnet_group_name   = aws_db_subnet_group.main.name
  vpc_security_group_ids = [aws_security_group.db.id]

  backup_retention_period = 7
  backup_window           = "03:00-04:00"
  maintenance_window      = "mon:04:00-mon:05:00"

  skip_final_snapshot       = false
  final_snapshot_identifier = "${{var.name_prefix}}-db-final-snapshot"

  tags = {{
    Name = "${{var.name_prefix}}-db"
  }}
}}

resource "aws_db_subnet_group" "main" {{
  name       = "${{var.name_prefix}}-db-subnet-group"
  subnet_ids = var.database_subnet_ids

  tags = {{
    Name = "${{var.name_prefix}}-db-subnet-group"
  }}
}}

resource "aws_security_group" "db" {{
  name        = "${{var.name_prefix}}-db-sg"
  description = "Security group for database"
  vpc_id      = var.vpc_id

  ingress {{
    from_port       = 5432
    to_port         = 5432
    protocol        = "tcp"
    security_groups = [aws_security_group.main.id]
  }}

  tags = {{
    Name = "${{var.name_prefix}}-db-sg"
  }}
}}"#
        )
    }

    fn load_balancer_block(&self) -> String {
        r#"# Application Load Balancer
resource "aws_lb" "main" {
  name               = "${var.name_prefix}-alb"
  internal           = false
  load_balancer_type = "application"
  security_groups    = [aws_security_group.alb.id]
  subnets            = var.public_subnet_ids

  enable_deletion_protection = false

  tags = {
    Name = "${var.name_prefix}-alb"
  }
}

resource "aws_lb_target_group" "main" {
  name     = "${var.name_prefix}-tg"
  port     = 80
  protocol = "HTTP"
  vpc_id   = var.vpc_id

  health_check {
    enabled             = true
    healthy_threshold   = 2
    interval            = 30
    matcher             = "200"
    path                = "/health"
    port                = "traffic-port"
    protocol            = "HTTP"
    timeout             = 5
    unhealthy_threshold = 2
  }

  tags = {
    Name = "${var.name_prefix}-tg"
  }
}

resource "aws_lb_listener" "http" {
  load_balancer_arn = aws_lb.main.arn
  port              = "80"
  protocol          = "HTTP"

  default_action {
    type             = "forward"
    target_group_arn = aws_lb_target_group.main.arn
  }
}

resource "aws_security_group" "alb" {
  name        = "${var.name_prefix}-alb-sg"
  description = "Security group for ALB"
  vpc_id      = var.vpc_id

  ingress {
    from_port   = 80
    to_port     = 80
    protocol    = "tcp"
    cidr_blocks = ["0.0.0.0/0"]
  }

  ingress {
    from_port   = 443
    to_port     = 443
    protocol    = "tcp"
    cidr_blocks = ["0.0.0.0/0"]
  }

  egress {
    from_port   = 0
    to_port     = 0
    protocol    = "-1"
    cidr_blocks = ["0.0.0.0/0"]
  }

  tags = {
    Name = "${var.name_prefix}-alb-sg"
  }
}"#
        .to_string()
    }

    fn resource_blocks(&self, request: &ResolvedRequest) -> Vec<String> {
        let mut blocks = Vec::new();
        let wants_instance = request.mentions(&["instance", "vm", "server"])
            || request.parameters.contains_group(ParamGroupKind::Compute);
        let wants_storage = request.mentions(&["storage", "bucket", "volume"])
            || (request.parameters.contains_group(ParamGroupKind::Storage)
                && !request.mentions(&["database"]));

        if wants_instance {
            blocks.push(self.compute_block(request));
        }
        if wants_storage {
            blocks.push(self.storage_block(request));
        }
        if request.mentions(&["database"]) {
            blocks.push(self.database_block(request));
        }
        if request.mentions(&["load_balancer"]) {
            blocks.push(self.load_balancer_block());
        }
        blocks
    }

    fn outputs(&self, request: &ResolvedRequest) -> String {
        let mut outputs = Vec::new();
        let single_instance = request.mentions(&["instance", "vm", "server"])
            && !request.parameters.flag(ParamGroupKind::Scaling, "auto_scaling")
            && request.parameters.get_int(ParamGroupKind::Scaling, "count").unwrap_or(1) <= 1;

        if single_instance {
            outputs.push(
                r#"output "instance_id" {
  description = "ID of the compute instance"
  value       = aws_instance.main.id
}"#
                .to_string(),
            );
        }
        if request.mentions(&["storage", "bucket"]) {
            outputs.push(
                r#"output "bucket_name" {
  description = "Name of the storage bucket"
  value       = aws_s3_bucket.main.id
}"#
                .to_string(),
            );
        }
        if request.mentions(&["database"]) {
            outputs.push(
                r#"output "database_endpoint" {
  description = "Database connection endpoint"
  value       = aws_db_instance.main.endpoint
}"#
                .to_string(),
            );
        }
        if request.mentions(&["load_balancer"]) {
            outputs.push(
                r#"output "load_balancer_dns" {
  description = "DNS name of the load balancer"
  value       = aws_lb.main.dns_name
}"#
                .to_string(),
            );
        }
        outputs.join("\n\n")
    }
}

impl ArtifactGenerator for TerraformGenerator {
    fn format(&self) -> IacFormat {
        IacFormat::Terraform
    }

    fn generate(&self, request: &ResolvedRequest) -> GenResult<Artifact> {
        let provider = request.provider.unwrap_or(CloudProvider::Aws);
        debug!(%provider, action = %request.action, "generating terraform configuration");

        let mut sections = vec![self.provider_block(provider), self.variables(request)];

        // Resource templates exist for AWS; other providers get the
        // provider and variable scaffolding only.
        if provider == CloudProvider::Aws {
            sections.extend(self.resource_blocks(request));
            let outputs = self.outputs(request);
            if !outputs.is_empty() {
                sections.push(outputs);
            }
        }

        let content = self.merge_documents(sections);
        Ok(Artifact {
            format: IacFormat::Terraform,
            provider: Some(provider),
            content,
        })
    }

    fn merge_documents(&self, docs: Vec<String>) -> String {
        let mut merged = docs
            .into_iter()
            .filter(|d| !d.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        if !merged.ends_with('\n') {
            merged.push('\n');
        }
        merged
    }
}
