//! Canned post templates.
//!
//! Each template is a static (title, body, tags) triple; applying one
//! replaces the whole draft wholesale. Bodies are stored in canonical
//! serialized form so they round-trip bit-exactly through load/serialize.

use crate::editing::Document;

/// A named post skeleton offered by the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub key: &'static str,
    pub title: &'static str,
    pub body: &'static str,
    pub tags: &'static [&'static str],
}

pub const TEMPLATES: &[Template] = &[
    Template {
        key: "incident-response",
        title: "Security Incident Response Report",
        body: "<h2>Summary</h2>\
               <p>Describe the incident in one or two sentences: what happened, when it was detected, and the current status.</p>\
               <h2>Timeline</h2>\
               <ul><li>Detection</li><li>Containment</li><li>Eradication</li><li>Recovery</li></ul>\
               <h2>Impact</h2>\
               <p>Affected systems, data, and users.</p>\
               <h2>Lessons Learned</h2>\
               <ul><li>What worked</li><li>What needs improvement</li></ul>",
        tags: &["Incident Response", "Security Operations", "Forensics"],
    },
    Template {
        key: "vulnerability-disclosure",
        title: "Vulnerability Disclosure Report",
        body: "<h2>Overview</h2>\
               <p>Component, affected versions, and severity.</p>\
               <h2>Reproduction</h2>\
               <pre><code language=\"bash\">curl -i https://target.example/api/resource</code></pre>\
               <h2>Impact</h2>\
               <p>What an attacker can achieve.</p>\
               <h2>Remediation</h2>\
               <p>Fix guidance and workarounds.</p>\
               <h2>Disclosure Timeline</h2>\
               <ul><li>Reported to vendor</li><li>Vendor acknowledged</li><li>Fix released</li><li>Public disclosure</li></ul>",
        tags: &["Vulnerability Research", "Responsible Disclosure", "Web Security"],
    },
    Template {
        key: "malware-analysis",
        title: "Malware Analysis Write-Up",
        body: "<h2>Sample</h2>\
               <p>Hashes, file type, and delivery vector.</p>\
               <h2>Static Analysis</h2>\
               <p>Strings, imports, and packing observations.</p>\
               <h2>Dynamic Analysis</h2>\
               <p>Process, network, and persistence behavior.</p>\
               <h2>Indicators of Compromise</h2>\
               <ul><li>File hashes</li><li>Domains and IPs</li><li>Registry keys</li></ul>",
        tags: &["Malware Analysis", "Reverse Engineering", "Threat Intelligence"],
    },
    Template {
        key: "pentest-report",
        title: "Penetration Test Findings",
        body: "<h2>Scope</h2>\
               <p>Targets, test window, and rules of engagement.</p>\
               <h2>Findings</h2>\
               <ul><li>Finding title, severity, and affected asset</li><li>Evidence and reproduction steps</li><li>Remediation advice</li></ul>\
               <h2>Conclusion</h2>\
               <p>Overall posture and prioritized next steps.</p>",
        tags: &["Penetration Testing", "Red Team", "Reporting"],
    },
];

/// Look up a template by key.
pub fn find(key: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.key == key)
}

/// The composer's editable state: title, body document, and tag list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    pub title: String,
    pub document: Document,
    pub tags: Vec<String>,
}

impl Draft {
    pub fn new() -> Self {
        Draft {
            title: String::new(),
            document: Document::new(),
            tags: Vec::new(),
        }
    }

    /// Replace the whole draft with a template.
    ///
    /// Destructive and unconditional: prior title, body and tags are
    /// discarded, never merged. Unknown keys leave the draft untouched and
    /// return `false`.
    pub fn apply_template(&mut self, key: &str) -> bool {
        match find(key) {
            Some(template) => {
                self.title = template.title.to_string();
                self.document = Document::load(template.body);
                self.tags = template.tags.iter().map(|t| t.to_string()).collect();
                true
            }
            None => false,
        }
    }

    /// Gate for the save action: a draft needs a title and a body.
    pub fn can_save(&self) -> bool {
        !self.title.trim().is_empty() && !self.document.is_empty()
    }

    /// Split a comma-separated tag field into clean tags.
    pub fn parse_tags(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}
