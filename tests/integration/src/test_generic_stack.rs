//! Reuse of the generic building blocks outside the audit trail stack.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use trailstack_model::{
        BucketEncryption, BucketProps, EventSelectorOptions, PolicyStatement, Principal,
        ReadWriteType, RemovalPolicy, ResourceError, ResourceType, TrailProps,
    };
    use trailstack_synth::{
        S3Source, Stack, StackProps, SynthError, cloudtrail_delivery_grants,
    };

    use crate::resources_of_type;

    #[test]
    fn test_should_synthesize_empty_stack() {
        let stack = Stack::new("MyTestStack", StackProps::default()).unwrap();
        let template = stack.synth().unwrap();
        assert_eq!(template.to_value().unwrap(), json!({"Resources": {}}));
        assert_eq!(template.to_json().unwrap(), "{\n  \"Resources\": {}\n}");
    }

    #[test]
    fn test_should_audit_several_buckets_with_prefixes() {
        let mut stack = Stack::new("Multi", StackProps::default()).unwrap();
        let uploads = stack.add_bucket("Uploads", BucketProps::default()).unwrap();
        let reports = stack
            .add_bucket(
                "Reports",
                BucketProps::builder()
                    .encryption(BucketEncryption::KmsManaged)
                    .build(),
            )
            .unwrap();
        let logs = stack.add_bucket("Logs", BucketProps::default()).unwrap();

        let grants = cloudtrail_delivery_grants(stack.bucket(logs).unwrap(), &stack.account());
        for grant in &grants {
            stack.add_to_resource_policy(logs, grant.clone()).unwrap();
        }
        stack.ensure_attached(logs, &grants).unwrap();

        let trail = stack
            .add_trail(
                "Trail",
                logs,
                TrailProps::builder()
                    .trail_name("uploads-audit")
                    .s3_key_prefix("audit")
                    .build(),
            )
            .unwrap();
        stack
            .add_s3_event_selector(
                trail,
                &[
                    S3Source {
                        bucket: uploads,
                        object_prefix: Some("incoming/".to_owned()),
                    },
                    reports.into(),
                ],
                EventSelectorOptions::builder()
                    .read_write_type(ReadWriteType::ReadOnly)
                    .build(),
            )
            .unwrap();

        let template = stack.synth().unwrap();
        assert_eq!(template.count_of_type(ResourceType::Bucket), 3);
        assert_eq!(template.count_of_type(ResourceType::BucketPolicy), 1);
        assert_eq!(template.count_of_type(ResourceType::LogGroup), 0);

        let json = template.to_value().unwrap();
        let (_, trail_json) = resources_of_type(&json, "AWS::CloudTrail::Trail")[0];
        let props = &trail_json["Properties"];
        assert_eq!(props["TrailName"], json!("uploads-audit"));
        assert_eq!(props["S3KeyPrefix"], json!("audit"));
        assert!(props.get("CloudWatchLogsLogGroupArn").is_none());
        assert_eq!(props["EventSelectors"][0]["IncludeManagementEvents"], json!(true));
        assert_eq!(props["EventSelectors"][0]["ReadWriteType"], json!("ReadOnly"));
        assert_eq!(
            props["EventSelectors"][0]["DataResources"][0]["Values"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
        assert_eq!(trail_json["DependsOn"], json!(["LogsPolicy90DB40C9"]));

        let (_, reports_json) = resources_of_type(&json, "AWS::S3::Bucket")
            .into_iter()
            .find(|(id, _)| id.starts_with("Reports"))
            .unwrap();
        assert_eq!(
            reports_json["Properties"]["BucketEncryption"]["ServerSideEncryptionConfiguration"][0]
                ["ServerSideEncryptionByDefault"]["SSEAlgorithm"],
            json!("aws:kms")
        );
        assert_eq!(reports_json["DeletionPolicy"], json!("Retain"));
    }

    #[test]
    fn test_should_reject_unattached_grant() {
        let mut stack = Stack::new("S", StackProps::default()).unwrap();
        let logs = stack.add_bucket("Logs", BucketProps::default()).unwrap();
        let grants = cloudtrail_delivery_grants(stack.bucket(logs).unwrap(), &stack.account());
        stack.add_to_resource_policy(logs, grants[0].clone()).unwrap();

        let err = stack.ensure_attached(logs, &grants).unwrap_err();
        assert!(matches!(
            err,
            SynthError::Resource(ResourceError::UnattachedGrant { ref actions, .. })
                if actions == "s3:PutObject"
        ));
    }

    #[test]
    fn test_should_reject_incomplete_statement() {
        let mut stack = Stack::new("S", StackProps::default()).unwrap();
        let logs = stack.add_bucket("Logs", BucketProps::default()).unwrap();
        let no_principal = PolicyStatement::builder()
            .actions(vec!["s3:GetObject".to_owned()])
            .resources(vec![stack.bucket(logs).unwrap().bucket_arn()])
            .build();
        assert!(matches!(
            stack.add_to_resource_policy(logs, no_principal),
            Err(SynthError::Resource(ResourceError::EmptyPrincipals))
        ));

        let no_resource = PolicyStatement::builder()
            .principals(vec![Principal::service("cloudtrail.amazonaws.com")])
            .actions(vec!["s3:GetObject".to_owned()])
            .build();
        assert!(matches!(
            stack.add_to_resource_policy(logs, no_resource),
            Err(SynthError::Resource(ResourceError::EmptyResources))
        ));
        assert!(stack.bucket(logs).unwrap().policy().is_empty());
    }

    #[test]
    fn test_should_reject_self_auditing_trail() {
        let mut stack = Stack::new("S", StackProps::default()).unwrap();
        let logs = stack.add_bucket("Logs", BucketProps::default()).unwrap();
        let trail = stack.add_trail("Trail", logs, TrailProps::default()).unwrap();
        let err = stack
            .add_s3_event_selector(trail, &[logs.into()], EventSelectorOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SynthError::Resource(ResourceError::SelfAuditingTrail { .. })
        ));
    }

    #[test]
    fn test_should_reject_conflicting_declarations() {
        let mut stack = Stack::new("S", StackProps::default()).unwrap();
        let named = |name: &str| BucketProps::builder().bucket_name(name).build();

        stack.add_bucket("A", named("shared-name")).unwrap();
        assert!(matches!(
            stack.add_bucket("B", named("shared-name")),
            Err(SynthError::DuplicateBucketName { .. })
        ));
        assert!(matches!(
            stack.add_bucket("A", named("other-name")),
            Err(SynthError::DuplicateConstructId { .. })
        ));
        assert!(matches!(
            stack.add_bucket("C", named("Not_Valid")),
            Err(SynthError::Resource(ResourceError::InvalidBucketName { .. }))
        ));
        assert!(matches!(
            stack.add_bucket(
                "D",
                BucketProps::builder()
                    .auto_delete_objects(true)
                    .removal_policy(RemovalPolicy::Retain)
                    .build()
            ),
            Err(SynthError::Resource(ResourceError::AutoDeleteRequiresDestroy { .. }))
        ));
        assert_eq!(stack.buckets().len(), 1);
    }

    #[test]
    fn test_should_reject_handles_from_other_stacks() {
        let mut one = Stack::new("One", StackProps::default()).unwrap();
        let mut two = Stack::new("Two", StackProps::default()).unwrap();
        let bucket = one.add_bucket("Logs", BucketProps::default()).unwrap();
        let trail = one.add_trail("Trail", bucket, TrailProps::default()).unwrap();
        two.add_bucket("Logs", BucketProps::default()).unwrap();

        assert!(matches!(
            two.trail(trail),
            Err(SynthError::ForeignHandle { kind: "trail", .. })
        ));
        assert!(matches!(
            two.ensure_attached(bucket, &[]),
            Err(SynthError::ForeignHandle { kind: "bucket", .. })
        ));
    }
}
