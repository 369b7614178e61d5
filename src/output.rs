//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use chrono::{DateTime, Utc};

use crate::{Catalog, CatalogService, Collection, Item, Job, Process, Resource};

/// Trait for human-readable key-value output.
///
/// Implemented by entity types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

impl<T: PrettyPrint> PrettyPrint for Resource<T> {
    fn pretty_print(&self) -> String {
        self.data().pretty_print()
    }
}

fn header(kind: &str, id: &str) -> Vec<String> {
    let header = format!("{kind}: {id}");
    let divider = "─".repeat(header.len().max(30));
    vec![header, divider]
}

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

impl PrettyPrint for CatalogService {
    fn pretty_print(&self) -> String {
        let mut lines = header("Catalogue", &self.id);

        if let Some(ref title) = self.title {
            lines.push(format!("Title:          {}", title));
        }
        if let Some(ref version) = self.stac_version {
            lines.push(format!("STAC Version:   {}", version));
        }
        lines.push(format!("Conforms To:    {} classes", self.conforms_to.len()));

        lines.join("\n")
    }
}

impl PrettyPrint for Catalog {
    fn pretty_print(&self) -> String {
        let mut lines = header("Catalog", &self.id);

        if let Some(ref title) = self.title {
            lines.push(format!("Title:          {}", title));
        }
        if !self.description.is_empty() {
            lines.push(format!("Description:    {}", self.description));
        }
        let children = self.links.iter().filter(|l| l.rel == crate::rel::CHILD).count();
        if children > 0 {
            lines.push(format!("Children:       {}", children));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Collection {
    fn pretty_print(&self) -> String {
        let mut lines = header("Collection", &self.id);

        if let Some(ref title) = self.title {
            lines.push(format!("Title:          {}", title));
        }
        if let Some(ref license) = self.license {
            lines.push(format!("License:        {}", license));
        }

        if let Some(ref extent) = self.extent {
            if let Some(bbox) = extent.spatial.bbox.first() {
                let coords: Vec<String> = bbox.iter().map(|c| c.to_string()).collect();
                lines.push(format!("BBox:           [{}]", coords.join(", ")));
            }
            if let Some([start, end]) = extent.temporal.interval.first() {
                let fmt = |dt: &Option<DateTime<Utc>>| dt.as_ref().map(timestamp).unwrap_or_else(|| "..".to_string());
                lines.push(format!("Interval:       {} / {}", fmt(start), fmt(end)));
            }
        }

        if !self.keywords.is_empty() {
            lines.push(format!("Keywords:       {}", self.keywords.join(", ")));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Item {
    fn pretty_print(&self) -> String {
        let mut lines = header("Item", &self.id);

        if let Some(ref collection) = self.collection {
            lines.push(format!("Collection:     {}", collection));
        }
        if let Some(dt) = self.datetime() {
            lines.push(format!("Datetime:       {}", timestamp(&dt)));
        }
        if let Some(ref bbox) = self.bbox {
            let coords: Vec<String> = bbox.iter().map(|c| c.to_string()).collect();
            lines.push(format!("BBox:           [{}]", coords.join(", ")));
        }
        if !self.assets.is_empty() {
            let names: Vec<&str> = self.assets.keys().map(String::as_str).collect();
            lines.push(format!("Assets:         {}", names.join(", ")));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Process {
    fn pretty_print(&self) -> String {
        let mut lines = header("Process", &self.id);

        if let Some(ref title) = self.title {
            lines.push(format!("Title:          {}", title));
        }
        if let Some(ref version) = self.version {
            lines.push(format!("Version:        {}", version));
        }
        if let Some(ref description) = self.description {
            lines.push(format!("Description:    {}", description));
        }

        let inputs: Vec<&str> = self.inputs.keys().map(String::as_str).collect();
        if !inputs.is_empty() {
            lines.push(format!("Inputs:         {}", inputs.join(", ")));
        }
        let outputs: Vec<&str> = self.outputs.keys().map(String::as_str).collect();
        if !outputs.is_empty() {
            lines.push(format!("Outputs:        {}", outputs.join(", ")));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Job {
    fn pretty_print(&self) -> String {
        let mut lines = header("Job", &self.id);

        if let Some(ref process_id) = self.process_id {
            lines.push(format!("Process:        {}", process_id));
        }
        lines.push(format!("Status:         {}", self.status));

        if let Some(progress) = self.progress {
            lines.push(format!("Progress:       {}%", progress));
        }
        if let Some(ref message) = self.message {
            lines.push(format!("Message:        {}", message));
        }
        if let Some(ref created) = self.created {
            lines.push(format!("Created:        {}", timestamp(created)));
        }
        if let Some(ref finished) = self.finished {
            lines.push(format!("Finished:       {}", timestamp(finished)));
        }

        lines.join("\n")
    }
}
