//! Schema baseline for the site content document
//!
//! [`defaults`] is the fully populated reference document. It defines which
//! sections and record fields exist and supplies the values a fresh site
//! starts with. Seeded collection entries use fixed ids so that every call
//! returns the same document.

use std::collections::BTreeMap;

use crate::document::{Document, Node};

/// Name of the institute in the baseline content
pub const INSTITUTE_NAME: &str = "Northbridge Skills Institute";

/// Top-level sections, in the order the admin panel lists them
pub const SECTIONS: [&str; 11] = [
    "site",
    "navigation",
    "home",
    "courses",
    "notices",
    "gallery",
    "faqs",
    "legal",
    "career",
    "pages",
    "forms",
];

fn text(s: &str) -> Node {
    Node::text(s)
}

fn entry<const N: usize>(id: &str, fields: [(&str, Node); N]) -> Node {
    Node::record(std::iter::once(("id", text(id))).chain(fields))
}

fn texts(items: &[&str]) -> Node {
    Node::list(items.iter().map(|s| text(s)))
}

/// The baseline document
pub fn defaults() -> Document {
    let sections: BTreeMap<String, Node> = [
        ("site", site()),
        ("navigation", navigation()),
        ("home", home()),
        ("courses", courses()),
        ("notices", notices()),
        ("gallery", gallery()),
        ("faqs", faqs()),
        ("legal", legal()),
        ("career", career()),
        ("pages", pages()),
        ("forms", forms()),
    ]
    .into_iter()
    .map(|(name, node)| (name.to_string(), node))
    .collect();

    Document::from_sections(sections)
}

fn site() -> Node {
    Node::record([
        ("name", text(INSTITUTE_NAME)),
        ("tagline", text("Practical skills for real careers")),
        ("logo", text("")),
        ("favicon", text("")),
        ("email", text("info@northbridge.example")),
        ("phone", text("+1 555 0134")),
        ("address", text("14 Harbour Road, Northbridge")),
        ("established", text("2009")),
        (
            "socials",
            Node::record([
                ("facebook", text("")),
                ("instagram", text("")),
                ("youtube", text("")),
                ("linkedin", text("")),
            ]),
        ),
        (
            "footer",
            Node::record([
                (
                    "text",
                    text("Hands-on training in technology, design and business."),
                ),
                ("copyright", text("© Northbridge Skills Institute")),
            ]),
        ),
    ])
}

fn navigation() -> Node {
    Node::record([
        (
            "links",
            Node::list([
                entry("nav-home", [("label", text("Home")), ("href", text("/"))]),
                entry("nav-courses", [("label", text("Courses")), ("href", text("/courses"))]),
                entry("nav-gallery", [("label", text("Gallery")), ("href", text("/gallery"))]),
                entry("nav-notices", [("label", text("Notices")), ("href", text("/notices"))]),
                entry("nav-career", [("label", text("Career")), ("href", text("/career"))]),
                entry("nav-contact", [("label", text("Contact")), ("href", text("/contact"))]),
            ]),
        ),
        (
            "cta",
            Node::record([("label", text("Enroll Now")), ("href", text("/enroll"))]),
        ),
    ])
}

fn home() -> Node {
    Node::record([
        (
            "hero",
            Node::record([
                ("title", text("Build the skills employers are hiring for")),
                (
                    "subtitle",
                    text("Instructor-led courses with projects, mentoring and placement support."),
                ),
                ("background", text("")),
                ("cta_label", text("Browse Courses")),
                ("cta_href", text("/courses")),
                ("visible", Node::bool(true)),
            ]),
        ),
        (
            "about",
            Node::record([
                ("title", text("About Us")),
                (
                    "body",
                    text("Since 2009 we have trained thousands of students in small, practical batches."),
                ),
                ("image", text("")),
                ("visible", Node::bool(true)),
            ]),
        ),
        (
            "stats",
            Node::record([
                ("visible", Node::bool(true)),
                (
                    "items",
                    Node::list([
                        entry("stat-students", [("label", text("Students trained")), ("value", text("12,000+"))]),
                        entry("stat-courses", [("label", text("Courses")), ("value", text("25"))]),
                        entry("stat-placement", [("label", text("Placement rate")), ("value", text("87%"))]),
                    ]),
                ),
            ]),
        ),
        (
            "highlights",
            Node::record([
                ("title", text("Why Northbridge")),
                ("visible", Node::bool(true)),
                (
                    "items",
                    Node::list([
                        entry(
                            "hl-mentors",
                            [
                                ("title", text("Industry mentors")),
                                ("description", text("Learn from people who do the work every day.")),
                                ("icon", text("users")),
                            ],
                        ),
                        entry(
                            "hl-projects",
                            [
                                ("title", text("Project based")),
                                ("description", text("Every course ends with a portfolio project.")),
                                ("icon", text("briefcase")),
                            ],
                        ),
                        entry(
                            "hl-flexible",
                            [
                                ("title", text("Flexible batches")),
                                ("description", text("Weekday, weekend and online options.")),
                                ("icon", text("clock")),
                            ],
                        ),
                    ]),
                ),
            ]),
        ),
        (
            "testimonials",
            Node::record([
                ("title", text("What our students say")),
                ("visible", Node::bool(true)),
                (
                    "items",
                    Node::list([entry(
                        "tm-1",
                        [
                            ("name", text("A. Rahman")),
                            ("role", text("Web Developer")),
                            ("quote", text("The project work got me my first job.")),
                            ("photo", text("")),
                        ],
                    )]),
                ),
            ]),
        ),
    ])
}

fn course<const N: usize>(id: &str, fields: [(&str, Node); N], highlights: &[&str]) -> Node {
    Node::record(
        std::iter::once(("id", text(id)))
            .chain(fields)
            .chain(std::iter::once(("highlights", texts(highlights)))),
    )
}

fn courses() -> Node {
    Node::record([
        ("title", text("Our Courses")),
        ("intro", text("Choose a track and start with the next batch.")),
        (
            "list",
            Node::list([
                course(
                    "course-web",
                    [
                        ("title", text("Full-Stack Web Development")),
                        ("category", text("Technology")),
                        ("duration", text("6 months")),
                        ("fee", text("1,200")),
                        ("mode", text("Classroom")),
                        ("summary", text("HTML, CSS, JavaScript, a backend framework and databases.")),
                        ("image", text("")),
                        ("featured", Node::bool(true)),
                    ],
                    &["Live projects", "Code reviews", "Placement support"],
                ),
                course(
                    "course-design",
                    [
                        ("title", text("Graphic & UI Design")),
                        ("category", text("Design")),
                        ("duration", text("4 months")),
                        ("fee", text("900")),
                        ("mode", text("Hybrid")),
                        ("summary", text("Layout, typography, branding and interface design.")),
                        ("image", text("")),
                        ("featured", Node::bool(true)),
                    ],
                    &["Portfolio review", "Design tools"],
                ),
                course(
                    "course-accounting",
                    [
                        ("title", text("Computerized Accounting")),
                        ("category", text("Business")),
                        ("duration", text("3 months")),
                        ("fee", text("600")),
                        ("mode", text("Classroom")),
                        ("summary", text("Bookkeeping, payroll and tax basics with accounting software.")),
                        ("image", text("")),
                        ("featured", Node::bool(false)),
                    ],
                    &["Certification exam prep"],
                ),
            ]),
        ),
    ])
}

fn notices() -> Node {
    Node::record([
        ("title", text("Notice Board")),
        (
            "list",
            Node::list([entry(
                "notice-admission",
                [
                    ("title", text("Admissions open for the next batch")),
                    ("body", text("Seats are limited. Visit the office or apply online.")),
                    ("date", text("2024-01-08")),
                    ("pinned", Node::bool(true)),
                ],
            )]),
        ),
    ])
}

fn gallery() -> Node {
    Node::record([
        ("title", text("Gallery")),
        ("categories", texts(&["Campus", "Events", "Classes"])),
        ("items", Node::empty_list()),
    ])
}

fn faq(id: &str, question: &str, answer: &str, category: &str) -> Node {
    entry(
        id,
        [
            ("question", text(question)),
            ("answer", text(answer)),
            ("category", text(category)),
        ],
    )
}

fn faqs() -> Node {
    Node::record([
        ("title", text("Frequently Asked Questions")),
        (
            "list",
            Node::list([
                faq(
                    "faq-1",
                    "Do I need prior experience?",
                    "No. Every course starts from the fundamentals.",
                    "Admission",
                ),
                faq(
                    "faq-2",
                    "Do you offer certificates?",
                    "Yes, a certificate is issued after the final project.",
                    "General",
                ),
                faq(
                    "faq-3",
                    "Are weekend batches available?",
                    "Most courses run a weekend batch every quarter.",
                    "Schedule",
                ),
                faq(
                    "faq-4",
                    "Can I pay in installments?",
                    "Fees can be split into up to three installments.",
                    "Fees",
                ),
                faq(
                    "faq-5",
                    "Is there placement support?",
                    "Graduates get interview preparation and job referrals.",
                    "Career",
                ),
            ]),
        ),
    ])
}

fn legal_page(title: &str, body: &str) -> Node {
    Node::record([
        ("title", text(title)),
        ("body", text(body)),
        ("updated", text("2024-01-01")),
    ])
}

fn legal() -> Node {
    Node::record([
        (
            "privacy",
            legal_page(
                "Privacy Policy",
                "We only use your details to respond to enquiries and manage enrollment.",
            ),
        ),
        (
            "terms",
            legal_page(
                "Terms & Conditions",
                "Course schedules and fees may change with prior notice.",
            ),
        ),
        (
            "refund",
            legal_page(
                "Refund Policy",
                "Fees are refundable within seven days of admission, less processing charges.",
            ),
        ),
    ])
}

fn career() -> Node {
    Node::record([
        ("title", text("Join Our Team")),
        ("intro", text("We are always looking for instructors who love teaching.")),
        ("visible", Node::bool(true)),
        ("apply_email", text("careers@northbridge.example")),
        (
            "openings",
            Node::list([entry(
                "job-instructor-web",
                [
                    ("title", text("Web Development Instructor")),
                    ("location", text("Northbridge")),
                    ("kind", text("Part-time")),
                    (
                        "description",
                        text("Teach evening batches and mentor student projects."),
                    ),
                ],
            )]),
        ),
    ])
}

fn pages() -> Node {
    Node::record([("list", Node::empty_list())])
}

fn form_field(id: &str, name: &str, label: &str, kind: &str, required: bool) -> Node {
    entry(
        id,
        [
            ("name", text(name)),
            ("label", text(label)),
            ("kind", text(kind)),
            ("required", Node::bool(required)),
        ],
    )
}

fn forms() -> Node {
    Node::record([
        (
            "enrollment",
            Node::record([
                ("title", text("Enrollment Form")),
                ("intro", text("Fill in your details and we will call you back.")),
                ("submit_label", text("Submit Application")),
                (
                    "success_message",
                    text("Thank you! Our admissions team will contact you shortly."),
                ),
                (
                    "fields",
                    Node::list([
                        form_field("ef-name", "name", "Full name", "text", true),
                        form_field("ef-phone", "phone", "Phone", "tel", true),
                        form_field("ef-email", "email", "Email", "email", false),
                        form_field("ef-course", "course", "Course", "select", true),
                    ]),
                ),
            ]),
        ),
        (
            "contact",
            Node::record([
                ("title", text("Contact Us")),
                ("intro", text("Questions about a course? Send us a message.")),
                ("submit_label", text("Send Message")),
                ("success_message", text("Thanks for reaching out. We reply within a day.")),
                ("map_embed", text("")),
                (
                    "fields",
                    Node::list([
                        form_field("cf-name", "name", "Your name", "text", true),
                        form_field("cf-email", "email", "Email", "email", true),
                        form_field("cf-message", "message", "Message", "textarea", true),
                    ]),
                ),
            ]),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn check_unique_ids(node: &Node, at: &str) {
        match node {
            Node::List(items) => {
                let mut seen = HashSet::new();
                for item in items.iter() {
                    if let Some(id) = item.entry_id() {
                        assert!(seen.insert(id), "duplicate id {} in {}", id, at);
                    }
                    check_unique_ids(item, at);
                }
            }
            Node::Record(fields) => {
                for (name, child) in fields.iter() {
                    check_unique_ids(child, &format!("{}.{}", at, name));
                }
            }
            _ => {}
        }
    }

    #[test]
    fn test_defaults_cover_every_section() {
        let doc = defaults();
        let mut names = doc.section_names();
        names.sort();
        let mut expected = SECTIONS.to_vec();
        expected.sort();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_defaults_are_constant() {
        assert_eq!(defaults(), defaults());
        assert_eq!(
            defaults().section("site").unwrap().get("name").and_then(Node::as_str),
            Some(INSTITUTE_NAME)
        );
    }

    #[test]
    fn test_collection_entries_have_unique_ids() {
        check_unique_ids(defaults().root(), "");
    }
}
