//! Full synthesis of the audit trail stack.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use trailstack_synth::StackProps;

    use crate::audit_template;

    #[test]
    fn test_should_synthesize_my_test_stack() {
        let mut template = audit_template("MyTestStack", StackProps::default());
        let handler = "CustomS3AutoDeleteObjectsCustomResourceProviderHandler9D90184F";
        let code = template["Resources"][handler]["Properties"]
            .as_object_mut()
            .and_then(|props| props.remove("Code"))
            .unwrap();
        assert!(code["ZipFile"].as_str().unwrap().contains("list_object_versions"));

        let provider_role = "CustomS3AutoDeleteObjectsCustomResourceProviderRole3B1BD092";
        let provider_role_arn = json!({"Fn::GetAtt": [provider_role, "Arn"]});
        let empty_on_delete = |bucket: &str, policy: &str| {
            json!({
                "Type": "Custom::S3AutoDeleteObjects",
                "Properties": {
                    "BucketName": {"Ref": bucket},
                    "ServiceToken": {"Fn::GetAtt": [handler, "Arn"]}
                },
                "DependsOn": [policy],
                "UpdateReplacePolicy": "Delete",
                "DeletionPolicy": "Delete"
            })
        };
        let delete_objects = |bucket: &str| {
            let arn = json!({"Fn::GetAtt": [bucket, "Arn"]});
            json!({
                "Action": ["s3:DeleteObject*", "s3:GetBucket*", "s3:List*"],
                "Effect": "Allow",
                "Principal": {"AWS": provider_role_arn},
                "Resource": [arn, {"Fn::Join": ["", [arn, "/*"]]}]
            })
        };

        let private_bucket = |name: &str| {
            json!({
                "Type": "AWS::S3::Bucket",
                "Properties": {
                    "BucketEncryption": {
                        "ServerSideEncryptionConfiguration": [
                            {"ServerSideEncryptionByDefault": {"SSEAlgorithm": "AES256"}}
                        ]
                    },
                    "BucketName": name,
                    "PublicAccessBlockConfiguration": {
                        "BlockPublicAcls": true,
                        "BlockPublicPolicy": true,
                        "IgnorePublicAcls": true,
                        "RestrictPublicBuckets": true
                    },
                    "Tags": [{"Key": "aws-cdk:auto-delete-objects", "Value": "true"}]
                },
                "UpdateReplacePolicy": "Delete",
                "DeletionPolicy": "Delete"
            })
        };
        let trail_bucket_arn = json!({"Fn::GetAtt": ["sampleTrailBucket0CA5F5BA", "Arn"]});
        let log_group_arn = json!({"Fn::GetAtt": ["sampleTargetTrailLogGroupDD09B61C", "Arn"]});

        let expected = json!({
            "Resources": {
                "samleTargetBucketFF9C9B7C": private_bucket("sublog.sample-target-bucket"),
                "samleTargetBucketPolicy23291F6A": {
                    "Type": "AWS::S3::BucketPolicy",
                    "Properties": {
                        "Bucket": {"Ref": "samleTargetBucketFF9C9B7C"},
                        "PolicyDocument": {
                            "Statement": [delete_objects("samleTargetBucketFF9C9B7C")],
                            "Version": "2012-10-17"
                        }
                    }
                },
                "samleTargetBucketAutoDeleteObjectsCustomResource1C6B9B05": empty_on_delete(
                    "samleTargetBucketFF9C9B7C",
                    "samleTargetBucketPolicy23291F6A"
                ),
                "sampleTrailBucket0CA5F5BA": private_bucket("sublog.sample-trail-bucket"),
                "sampleTrailBucketPolicy121802E0": {
                    "Type": "AWS::S3::BucketPolicy",
                    "Properties": {
                        "Bucket": {"Ref": "sampleTrailBucket0CA5F5BA"},
                        "PolicyDocument": {
                            "Statement": [
                                delete_objects("sampleTrailBucket0CA5F5BA"),
                                {
                                    "Action": "s3:GetBucketAcl",
                                    "Effect": "Allow",
                                    "Principal": {"Service": "cloudtrail.amazonaws.com"},
                                    "Resource": trail_bucket_arn
                                },
                                {
                                    "Action": "s3:PutObject",
                                    "Condition": {
                                        "StringEquals": {
                                            "s3:x-amz-acl": "bucket-owner-full-control"
                                        }
                                    },
                                    "Effect": "Allow",
                                    "Principal": {"Service": "cloudtrail.amazonaws.com"},
                                    "Resource": {"Fn::Join": ["", [
                                        trail_bucket_arn,
                                        "/AWSLogs/",
                                        {"Ref": "AWS::AccountId"},
                                        "/*"
                                    ]]}
                                }
                            ],
                            "Version": "2012-10-17"
                        }
                    }
                },
                "sampleTrailBucketAutoDeleteObjectsCustomResource6B5D2A99": empty_on_delete(
                    "sampleTrailBucket0CA5F5BA",
                    "sampleTrailBucketPolicy121802E0"
                ),
                provider_role: {
                    "Type": "AWS::IAM::Role",
                    "Properties": {
                        "AssumeRolePolicyDocument": {
                            "Statement": [{
                                "Action": "sts:AssumeRole",
                                "Effect": "Allow",
                                "Principal": {"Service": "lambda.amazonaws.com"}
                            }],
                            "Version": "2012-10-17"
                        },
                        "ManagedPolicyArns": [{"Fn::Join": ["", [
                            "arn:",
                            {"Ref": "AWS::Partition"},
                            ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole"
                        ]]}]
                    }
                },
                handler: {
                    "Type": "AWS::Lambda::Function",
                    "Properties": {
                        "Description":
                            "Empties S3 buckets tagged aws-cdk:auto-delete-objects before they are deleted",
                        "Handler": "index.handler",
                        "MemorySize": 128,
                        "Role": provider_role_arn,
                        "Runtime": "python3.12",
                        "Timeout": 900
                    },
                    "DependsOn": [provider_role]
                },
                "sampleTargetTrailLogGroupDD09B61C": {
                    "Type": "AWS::Logs::LogGroup",
                    "Properties": {"RetentionInDays": 365},
                    "UpdateReplacePolicy": "Retain",
                    "DeletionPolicy": "Retain"
                },
                "sampleTargetTrailLogsRoleB617F591": {
                    "Type": "AWS::IAM::Role",
                    "Properties": {
                        "AssumeRolePolicyDocument": {
                            "Statement": [{
                                "Action": "sts:AssumeRole",
                                "Effect": "Allow",
                                "Principal": {"Service": "cloudtrail.amazonaws.com"}
                            }],
                            "Version": "2012-10-17"
                        }
                    }
                },
                "sampleTargetTrailLogsRoleDefaultPolicy0EF78AAE": {
                    "Type": "AWS::IAM::Policy",
                    "Properties": {
                        "PolicyDocument": {
                            "Statement": [{
                                "Action": ["logs:PutLogEvents", "logs:CreateLogStream"],
                                "Effect": "Allow",
                                "Resource": log_group_arn
                            }],
                            "Version": "2012-10-17"
                        },
                        "PolicyName": "sampleTargetTrailLogsRoleDefaultPolicy0EF78AAE",
                        "Roles": [{"Ref": "sampleTargetTrailLogsRoleB617F591"}]
                    }
                },
                "sampleTargetTrail099DE26A": {
                    "Type": "AWS::CloudTrail::Trail",
                    "Properties": {
                        "CloudWatchLogsLogGroupArn": log_group_arn,
                        "CloudWatchLogsRoleArn": {
                            "Fn::GetAtt": ["sampleTargetTrailLogsRoleB617F591", "Arn"]
                        },
                        "EnableLogFileValidation": true,
                        "EventSelectors": [{
                            "DataResources": [{
                                "Type": "AWS::S3::Object",
                                "Values": [{"Fn::Join": ["", [
                                    {"Fn::GetAtt": ["samleTargetBucketFF9C9B7C", "Arn"]},
                                    "/"
                                ]]}]
                            }],
                            "IncludeManagementEvents": false,
                            "ReadWriteType": "WriteOnly"
                        }],
                        "IncludeGlobalServiceEvents": true,
                        "IsLogging": true,
                        "IsMultiRegionTrail": true,
                        "S3BucketName": {"Ref": "sampleTrailBucket0CA5F5BA"}
                    },
                    "DependsOn": [
                        "sampleTargetTrailLogsRoleDefaultPolicy0EF78AAE",
                        "sampleTrailBucketPolicy121802E0"
                    ]
                }
            }
        });

        assert_eq!(template, expected);
    }

    #[test]
    fn test_should_render_identically_twice() {
        let first = audit_template("MyTestStack", StackProps::default());
        let second = audit_template("MyTestStack", StackProps::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_should_keep_logical_ids_across_stack_ids() {
        let a = audit_template("MyTestStack", StackProps::default());
        let b = audit_template("S3PrivateBucketForTrailStack", StackProps::default());
        let ids = |t: &serde_json::Value| {
            t["Resources"]
                .as_object()
                .map(|r| r.keys().cloned().collect::<Vec<_>>())
                .unwrap_or_default()
        };
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_should_describe_stack() {
        let props = StackProps::builder().description("object write audit").build();
        let template = audit_template("Described", props);
        assert_eq!(template["Description"], json!("object write audit"));
    }
}
