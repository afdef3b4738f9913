//! Structural guarantees of the audit trail stack.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use trailstack_core::{AccountId, AwsRegion, Environment};
    use trailstack_model::ReadWriteType;
    use trailstack_synth::StackProps;

    use crate::{audit_stack, audit_template, resources_of_type};

    const STACK_IDS: &[&str] = &[
        "MyTestStack",
        "S3PrivateBucketForTrailStack",
        "a",
        "Audit-Prod-2",
        "x1234567890",
    ];

    #[test]
    fn test_should_declare_two_buckets_and_one_trail_for_any_id() {
        for id in STACK_IDS {
            let stack = audit_stack(id, StackProps::default());
            assert_eq!(stack.stack().buckets().len(), 2, "{id}");
            assert_eq!(stack.stack().trails().len(), 1, "{id}");
            assert_eq!(stack.stack().id().as_str(), *id);
        }
    }

    #[test]
    fn test_should_reject_invalid_stack_ids() {
        let too_long = "a".repeat(129);
        for id in ["", "1abc", "has space", "under_score", too_long.as_str()] {
            assert!(
                trailstack_synth::AuditTrailStack::new(id, StackProps::default()).is_err(),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_should_select_only_data_bucket() {
        let stack = audit_stack("MyTestStack", StackProps::default());
        let data = stack.data_bucket().unwrap().logical_id().to_owned();
        let trail_bucket = stack.trail_bucket().unwrap().logical_id().to_owned();

        for selector in stack.trail().unwrap().event_selectors() {
            assert_eq!(selector.source_buckets, vec![data.clone()]);
            assert!(!selector.source_buckets.contains(&trail_bucket));
            assert!(!selector.include_management_events);
            assert_eq!(selector.read_write_type, ReadWriteType::WriteOnly);
        }

        let template = audit_template("MyTestStack", StackProps::default());
        let (_, trail) = resources_of_type(&template, "AWS::CloudTrail::Trail")[0];
        let values = &trail["Properties"]["EventSelectors"][0]["DataResources"][0]["Values"];
        assert!(values.to_string().contains(&data));
        assert!(!values.to_string().contains(&trail_bucket));
    }

    #[test]
    fn test_should_harden_both_buckets() {
        let template = audit_template("MyTestStack", StackProps::default());
        let buckets = resources_of_type(&template, "AWS::S3::Bucket");
        assert_eq!(buckets.len(), 2);

        for (id, bucket) in buckets {
            let props = &bucket["Properties"];
            assert_eq!(
                props["PublicAccessBlockConfiguration"],
                json!({
                    "BlockPublicAcls": true,
                    "BlockPublicPolicy": true,
                    "IgnorePublicAcls": true,
                    "RestrictPublicBuckets": true
                }),
                "{id}"
            );
            assert_eq!(
                props["BucketEncryption"]["ServerSideEncryptionConfiguration"][0]
                    ["ServerSideEncryptionByDefault"]["SSEAlgorithm"],
                json!("AES256"),
                "{id}"
            );
            assert_eq!(bucket["DeletionPolicy"], json!("Delete"), "{id}");
        }
    }

    #[test]
    fn test_should_attach_both_grants() {
        let stack = audit_stack("MyTestStack", StackProps::default());
        let policy = stack.trail_bucket().unwrap().policy();
        assert_eq!(policy.len(), 3);
        for grant in stack.grants() {
            assert!(policy.contains(grant));
        }
        assert_eq!(stack.data_bucket().unwrap().policy().len(), 1);
    }

    #[test]
    fn test_should_grant_only_delivery_actions_to_cloudtrail() {
        let template = audit_template("MyTestStack", StackProps::default());
        let (_, policy) = resources_of_type(&template, "AWS::S3::BucketPolicy")
            .into_iter()
            .find(|(id, _)| id.starts_with("sampleTrailBucket"))
            .unwrap();

        let cloudtrail: Vec<_> = policy["Properties"]["PolicyDocument"]["Statement"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|s| s["Principal"] == json!({"Service": "cloudtrail.amazonaws.com"}))
            .collect();
        let actions: Vec<_> = cloudtrail.iter().map(|s| s["Action"].clone()).collect();
        assert_eq!(actions, vec![json!("s3:GetBucketAcl"), json!("s3:PutObject")]);
        for statement in cloudtrail {
            assert_eq!(statement["Effect"], json!("Allow"));
        }
    }

    #[test]
    fn test_should_give_every_disposable_bucket_an_emptying_resource() {
        let template = audit_template("MyTestStack", StackProps::default());
        let emptying = resources_of_type(&template, "Custom::S3AutoDeleteObjects");
        let functions = resources_of_type(&template, "AWS::Lambda::Function");
        assert_eq!(functions.len(), 1);
        let token = json!({"Fn::GetAtt": [functions[0].0, "Arn"]});

        for (bucket_id, bucket) in resources_of_type(&template, "AWS::S3::Bucket") {
            let tagged = bucket["Properties"]["Tags"]
                .as_array()
                .is_some_and(|tags| {
                    tags.contains(&json!({"Key": "aws-cdk:auto-delete-objects", "Value": "true"}))
                });
            assert!(tagged, "{bucket_id}");

            let (_, custom) = emptying
                .iter()
                .find(|(_, c)| c["Properties"]["BucketName"] == json!({"Ref": bucket_id}))
                .unwrap_or_else(|| panic!("{bucket_id} has no emptying resource"));
            assert_eq!(custom["Properties"]["ServiceToken"], token);

            let (policy_id, policy) = resources_of_type(&template, "AWS::S3::BucketPolicy")
                .into_iter()
                .find(|(_, p)| p["Properties"]["Bucket"] == json!({"Ref": bucket_id}))
                .unwrap();
            assert_eq!(custom["DependsOn"], json!([policy_id]));
            let statements = policy["Properties"]["PolicyDocument"]["Statement"].to_string();
            assert!(statements.contains("s3:DeleteObject*"), "{bucket_id}");
        }
        assert_eq!(emptying.len(), 2);
    }

    #[test]
    fn test_should_contain_only_derived_resource_types() {
        let template = audit_template("MyTestStack", StackProps::default());
        let mut counts = std::collections::BTreeMap::new();
        for resource in template["Resources"].as_object().unwrap().values() {
            *counts
                .entry(resource["Type"].as_str().unwrap().to_owned())
                .or_insert(0) += 1;
        }
        let expected: std::collections::BTreeMap<String, i32> = [
            ("AWS::CloudTrail::Trail", 1),
            ("AWS::IAM::Policy", 1),
            ("AWS::IAM::Role", 2),
            ("AWS::Lambda::Function", 1),
            ("AWS::Logs::LogGroup", 1),
            ("AWS::S3::Bucket", 2),
            ("AWS::S3::BucketPolicy", 2),
            ("Custom::S3AutoDeleteObjects", 2),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_should_inline_pinned_environment() {
        let props = StackProps::builder()
            .env(Environment {
                account: Some(AccountId::new("123456789012").unwrap()),
                region: Some(AwsRegion::new("eu-west-1")),
            })
            .build();
        let stack = audit_stack("Pinned", props);
        assert_eq!(stack.stack().account().as_literal(), Some("123456789012"));
        assert_eq!(stack.stack().region().as_literal(), Some("eu-west-1"));

        let template = stack.synth().unwrap().to_value().unwrap();
        let rendered = template.to_string();
        assert!(rendered.contains("/AWSLogs/123456789012/*"));
        assert!(!rendered.contains("AWS::AccountId"));
    }
}
