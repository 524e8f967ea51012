//! Service description and template fixtures

use std::io::Write;
use tempfile::NamedTempFile;

/// Service declaring two user pools, `Foo` (foo-domain) and `Bar` (bar-domain)
pub const SERVICE_WITH_POOLS: &str = r#"
service: auth-service
provider:
  name: aws
  stage: test
  region: us-east-1
resources:
  Resources:
    Foo:
      Type: AWS::Cognito::UserPool
      Properties:
        UserPoolName: foo-domain
    Bar:
      Type: AWS::Cognito::UserPool
      Properties:
        UserPoolName: bar-domain
"#;

/// Unresolved `serverless.yml` using short-form intrinsics, declaring `Foo`
/// (foo-domain) plus a pool whose name is computed at deploy time
pub const SERVICE_WITH_INTRINSICS: &str = r#"
service: auth-service
provider:
  name: aws
  stage: test
  region: us-east-1
  environment:
    USER_POOL_ID: !Ref Foo
functions:
  hello:
    handler: handler.hello
resources:
  Resources:
    Foo:
      Type: AWS::Cognito::UserPool
      Properties:
        UserPoolName: foo-domain
    Computed:
      Type: AWS::Cognito::UserPool
      Properties:
        UserPoolName: !Sub "${AWS::StackName}-users"
    FooClient:
      Type: AWS::Cognito::UserPoolClient
      Properties:
        UserPoolId: !Ref Foo
        ClientName: !Join ["-", [!Ref "AWS::StackName", client]]
  Outputs:
    FooProviderUrl:
      Value: !GetAtt Foo.ProviderURL
"#;

/// Service without any user pools
pub const SERVICE_WITHOUT_POOLS: &str = r#"
service: plain-service
provider:
  name: aws
resources:
  Resources:
    Bucket:
      Type: AWS::S3::Bucket
"#;

/// Compiled template matching [`SERVICE_WITH_POOLS`]
pub const TEMPLATE_WITH_POOLS: &str = r#"{
  "AWSTemplateFormatVersion": "2010-09-09",
  "Resources": {
    "ServerlessDeploymentBucket": { "Type": "AWS::S3::Bucket" },
    "Foo": {
      "Type": "AWS::Cognito::UserPool",
      "Properties": { "UserPoolName": "foo-domain" }
    },
    "Bar": {
      "Type": "AWS::Cognito::UserPool",
      "Properties": { "UserPoolName": "bar-domain" }
    }
  },
  "Outputs": {
    "ServerlessDeploymentBucketName": {
      "Value": { "Ref": "ServerlessDeploymentBucket" }
    }
  }
}"#;

fn write_temp(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Should create temp file");
    file.write_all(content.as_bytes())
        .expect("Should write temp file");
    file
}

/// Write a service description to a temp `.yml` file
pub fn service_file(content: &str) -> NamedTempFile {
    write_temp(content, ".yml")
}

/// Write a compiled template to a temp `.json` file
pub fn template_file(content: &str) -> NamedTempFile {
    write_temp(content, ".json")
}
