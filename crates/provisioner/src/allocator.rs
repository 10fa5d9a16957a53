//! Instance number allocation.
//!
//! The next number is derived from the instance directories already present in the home
//! directory, nothing is reserved on disk until the directory itself is created.

use support::fs::FileSystem;
use tracing::{debug, trace};

use crate::{errors::ProvisionerError, instance::Instance, settings::Settings};

/// Number encoded in an instance directory name, `gaia-node-105` gives `105`.
pub fn parse_instance_number(name: &str, prefix: &str) -> Option<u32> {
    let suffix = name.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    suffix.parse().ok()
}

/// Numbers of the instance directories found under the home directory, ascending.
pub async fn existing_numbers<FS>(
    filesystem: &FS,
    settings: &Settings,
) -> Result<Vec<u32>, ProvisionerError>
where
    FS: FileSystem + Send + Sync,
{
    let entries = filesystem.list_dir(settings.home_dir()).await?;
    let mut numbers = entries
        .into_iter()
        .filter(|entry| entry.is_dir)
        .filter_map(|entry| {
            let number = parse_instance_number(&entry.name, settings.node_dir_prefix());
            if number.is_none() {
                trace!("skipping {}", entry.name);
            }
            number
        })
        .collect::<Vec<_>>();

    numbers.sort_unstable();
    Ok(numbers)
}

/// One past the highest existing number, never below `first`.
///
/// Stray directories numbered below `first` (say `gaia-node-3`) don't pull the start down, every
/// instance keeps a number of at least `first` and a port in the expected range.
pub fn next_number(existing: &[u32], first: u32) -> Result<u32, ProvisionerError> {
    match existing.iter().max() {
        Some(max) => max
            .checked_add(1)
            .map(|next| next.max(first))
            .ok_or(ProvisionerError::NumberExhausted(*max)),
        None => Ok(first),
    }
}

/// `count` contiguous instances starting at `start`.
pub fn allocate(
    start: u32,
    count: u32,
    settings: &Settings,
) -> Result<Vec<Instance>, ProvisionerError> {
    if count == 0 {
        return Err(ProvisionerError::InvalidCount(count));
    }

    (0..count)
        .map(|i| {
            let number = start
                .checked_add(i)
                .ok_or(ProvisionerError::NumberExhausted(start))?;
            Instance::new(number, settings)
        })
        .collect()
}

/// Scan the home directory and lay out the next `count` instances.
pub async fn plan<FS>(
    filesystem: &FS,
    settings: &Settings,
    count: u32,
) -> Result<Vec<Instance>, ProvisionerError>
where
    FS: FileSystem + Send + Sync,
{
    let existing = existing_numbers(filesystem, settings).await?;
    let start = next_number(&existing, settings.first_instance_number())?;
    debug!(
        "found {} existing instance(s), starting at {start}",
        existing.len()
    );

    allocate(start, count, settings)
}

#[cfg(test)]
mod tests {
    use support::fs::in_memory::InMemoryFileSystem;

    use super::*;
    use crate::settings::SettingsBuilder;

    fn settings() -> Settings {
        SettingsBuilder::new()
            .with_home_dir("/home/operator")
            .build()
            .unwrap()
    }

    #[test]
    fn parse_instance_number_should_only_accept_numeric_suffixes() {
        assert_eq!(parse_instance_number("gaia-node-101", "gaia-node-"), Some(101));
        assert_eq!(parse_instance_number("gaia-node-info", "gaia-node-"), None);
        assert_eq!(parse_instance_number("gaia-node-", "gaia-node-"), None);
        assert_eq!(parse_instance_number("gaia-node-1a", "gaia-node-"), None);
        assert_eq!(parse_instance_number("gaia-node--3", "gaia-node-"), None);
        assert_eq!(parse_instance_number("other-101", "gaia-node-"), None);
        assert_eq!(
            parse_instance_number("gaia-node-99999999999", "gaia-node-"),
            None
        );
    }

    #[test]
    fn next_number_should_start_at_first_when_nothing_exists() {
        assert_eq!(next_number(&[], 101).unwrap(), 101);
    }

    #[test]
    fn next_number_should_follow_the_maximum() {
        assert_eq!(next_number(&[101, 104, 102], 101).unwrap(), 105);
        assert_eq!(next_number(&[250], 101).unwrap(), 251);
    }

    #[test]
    fn next_number_should_never_go_below_first() {
        assert_eq!(next_number(&[3, 7], 101).unwrap(), 101);
    }

    #[test]
    fn next_number_should_fail_when_exhausted() {
        let err = next_number(&[u32::MAX], 101).unwrap_err();

        assert!(matches!(err, ProvisionerError::NumberExhausted(u32::MAX)));
    }

    #[test]
    fn allocate_should_return_contiguous_numbers_and_ports() {
        let instances = allocate(120, 4, &settings()).unwrap();

        let numbers = instances.iter().map(Instance::number).collect::<Vec<_>>();
        let ports = instances.iter().map(Instance::port).collect::<Vec<_>>();
        assert_eq!(numbers, vec![120, 121, 122, 123]);
        assert_eq!(ports, vec![8220, 8221, 8222, 8223]);
        for instance in &instances {
            assert_eq!(u32::from(instance.port()), 8100 + instance.number());
        }
    }

    #[test]
    fn allocate_should_reject_zero_instances() {
        let err = allocate(101, 0, &settings()).unwrap_err();

        assert!(matches!(err, ProvisionerError::InvalidCount(0)));
    }

    #[test]
    fn allocate_should_fail_when_a_port_overflows() {
        let err = allocate(57434, 3, &settings()).unwrap_err();

        assert!(matches!(err, ProvisionerError::PortOutOfRange(57436, 8100)));
    }

    #[tokio::test]
    async fn plan_should_start_at_101_on_an_empty_home() {
        let fs = InMemoryFileSystem::with_dirs(["/home/operator"]);

        let instances = plan(&fs, &settings(), 1).await.unwrap();

        assert_eq!(instances[0].number(), 101);
        assert_eq!(instances[0].port(), 8201);
    }

    #[tokio::test]
    async fn plan_should_continue_after_the_highest_instance_directory() {
        let fs = InMemoryFileSystem::with_dirs([
            "/home/operator/gaia-node-101",
            "/home/operator/gaia-node-107",
            "/home/operator/gaia-node-103",
            "/home/operator/gaia-node-info",
        ]);
        // files never count as instances
        fs.write("/home/operator/gaia-node-900", "").await.unwrap();

        let instances = plan(&fs, &settings(), 2).await.unwrap();

        assert_eq!(
            instances
                .iter()
                .map(|i| (i.number(), i.port()))
                .collect::<Vec<_>>(),
            vec![(108, 8208), (109, 8209)]
        );
    }

    #[tokio::test]
    async fn existing_numbers_should_be_sorted() {
        let fs = InMemoryFileSystem::with_dirs([
            "/home/operator/gaia-node-110",
            "/home/operator/gaia-node-102",
        ]);

        assert_eq!(
            existing_numbers(&fs, &settings()).await.unwrap(),
            vec![102, 110]
        );
    }
}
