//! Object builders shared by the resource unit tests

use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::{Event, ObjectReference, Pod, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

pub fn meta(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        namespace: Some(namespace.into()),
        uid: Some(format!("{}/{}", namespace, name)),
        ..Default::default()
    }
}

pub fn pod(namespace: &str, name: &str, phase: &str) -> Pod {
    Pod {
        metadata: meta(namespace, name),
        status: Some(PodStatus {
            phase: Some(phase.into()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn owned_by<K: kube::Resource>(mut object: K, kind: &str, owner_uid: &str) -> K {
    object.meta_mut().owner_references = Some(vec![OwnerReference {
        api_version: "apps/v1".into(),
        kind: kind.into(),
        name: "owner".into(),
        uid: owner_uid.into(),
        controller: Some(true),
        ..Default::default()
    }]);
    object
}

pub fn replica_set(namespace: &str, name: &str, uid: &str, owner_uid: Option<&str>) -> ReplicaSet {
    let mut rs = ReplicaSet {
        metadata: meta(namespace, name),
        ..Default::default()
    };
    rs.metadata.uid = Some(uid.into());
    match owner_uid {
        Some(owner) => owned_by(rs, "Deployment", owner),
        None => rs,
    }
}

pub fn warning(pod: &Pod, reason: &str, message: &str) -> Event {
    Event {
        metadata: meta(
            pod.metadata.namespace.as_deref().unwrap_or_default(),
            &format!("{}.{}", pod.metadata.name.as_deref().unwrap_or_default(), reason),
        ),
        involved_object: ObjectReference {
            kind: Some("Pod".into()),
            name: pod.metadata.name.clone(),
            uid: pod.metadata.uid.clone(),
            ..Default::default()
        },
        type_: Some("Warning".into()),
        reason: Some(reason.into()),
        message: Some(message.into()),
        ..Default::default()
    }
}
