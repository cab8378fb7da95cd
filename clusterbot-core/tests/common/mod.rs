// Common helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use clusterbot_core::{Config, ConfigBuilder, Subsystem};

/// Fixture directory populated with the given `(subsystem, text)` pairs
pub fn fixture_dir(fixtures: &[(Subsystem, String)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (subsystem, text) in fixtures {
        write_fixture(dir.path(), *subsystem, text);
    }
    dir
}

pub fn write_fixture(dir: &Path, subsystem: Subsystem, text: &str) {
    fs::write(dir.join(format!("{}.txt", subsystem.key())), text).unwrap();
}

/// Offline configuration reading fixtures from `dir`
pub fn offline_config<I>(dir: &Path, services: I) -> Config
where
    I: IntoIterator<Item = Subsystem>,
{
    ConfigBuilder::new()
        .offline(true)
        .fixture_dir(dir)
        .services(services)
        .build()
        .unwrap()
}

pub fn yarn_node_list(running: usize) -> String {
    let mut text = format!("Total Nodes:{}\n", running);
    text.push_str("         Node-Id\t     Node-State\tNode-Http-Address\tNumber-of-Running-Containers\n");
    for i in 1..=running {
        text.push_str(&format!("slave{}:45454\t        RUNNING\tslave{}:8042\t0\n", i, i));
    }
    text
}

pub fn ping_sweep(attempted: u32, answered: u32) -> String {
    let mut text = String::new();
    for i in 1..=attempted {
        text.push_str(&format!("==> slave{}\n", i));
        text.push_str(&format!("PING slave{} 56(84) bytes of data.\n", i));
        if i <= answered {
            text.push_str("1 packets transmitted, 1 received, 0% packet loss, time 0ms\n");
        } else {
            text.push_str("1 packets transmitted, 0 received, 100% packet loss, time 0ms\n");
        }
    }
    text
}

pub fn jps_listing(hosts: u32, stale: u32) -> String {
    let mut text = String::new();
    for i in 1..=hosts {
        text.push_str(&format!("==> slave{}\n2101 DataNode\n", i));
        if i <= stale {
            text.push_str("3310 -- process information unavailable\n");
        }
    }
    text
}
