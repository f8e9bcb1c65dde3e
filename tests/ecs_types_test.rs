#[cfg(test)]
mod tests {
    use aws_sdk_ecs::types::{Container, Service, Tag, Task};

    const CLUSTER: &str = "arn:aws:ecs:us-east-1:123456789012:cluster/cluster-1";
    const TASK: &str =
        "arn:aws:ecs:us-east-1:123456789012:task/cluster-1/12345678-1234-1234-1234-000000000000";

    #[test]
    fn test_container_builder_digest_pinned_image() {
        let container = Container::builder()
            .container_arn("arn:aws:ecs:us-east-1:123456789012:container/abc")
            .image("nginx@sha256:abc123")
            .image_digest("sha256:abc123")
            .build();

        assert_eq!(container.image(), Some("nginx@sha256:abc123"));
        assert_eq!(container.image_digest(), Some("sha256:abc123"));
    }

    #[test]
    fn test_container_builder_without_digest() {
        // ECS agents before 1.70.0 may leave the digest out entirely
        let container = Container::builder().image("nginx:latest").build();

        assert_eq!(container.image(), Some("nginx:latest"));
        assert_eq!(container.image_digest(), None);
        assert_eq!(container.container_arn(), None);
    }

    #[test]
    fn test_task_builder_group_and_containers() {
        let task = Task::builder()
            .task_arn(TASK)
            .cluster_arn(CLUSTER)
            .group("service:service-1")
            .containers(Container::builder().image("image-1").build())
            .containers(Container::builder().image("image-2").build())
            .build();

        assert_eq!(task.group(), Some("service:service-1"));
        assert_eq!(task.cluster_arn(), Some(CLUSTER));
        assert_eq!(task.containers().len(), 2);
        assert_eq!(task.containers()[1].image(), Some("image-2"));
    }

    #[test]
    fn test_task_without_containers_returns_empty_slice() {
        let task = Task::builder().task_arn(TASK).build();

        assert!(task.containers().is_empty());
        assert_eq!(task.group(), None);
        assert_eq!(task.task_definition_arn(), None);
    }

    #[test]
    fn test_service_builder() {
        let service = Service::builder()
            .service_arn("arn:aws:ecs:us-east-1:123456789012:service/cluster-1/service-1")
            .cluster_arn(CLUSTER)
            .build();

        assert_eq!(
            service.service_arn(),
            Some("arn:aws:ecs:us-east-1:123456789012:service/cluster-1/service-1")
        );
        assert_eq!(service.cluster_arn(), Some(CLUSTER));
    }

    #[test]
    fn test_tag_builder_partial() {
        let tag = Tag::builder().key("env").build();

        assert_eq!(tag.key(), Some("env"));
        assert_eq!(tag.value(), None);
    }
}
