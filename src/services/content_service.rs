//! Static landing page content.

pub const EVENT_NAME: &str = "Ezhumi Hackathon";
pub const TAGLINE: &str = "Ezhumi isn't just a word. It's a wake-up call for students to rise, build, and make a difference in agriculture.";

pub struct Highlight {
    pub value: &'static str,
    pub label: &'static str,
}

pub struct Theme {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneKind {
    Upcoming,
    Featured,
    Future,
}

pub struct Milestone {
    pub date: &'static str,
    pub time: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub kind: MilestoneKind,
}

impl Milestone {
    pub fn is_featured(&self) -> bool {
        self.kind == MilestoneKind::Featured
    }

    pub fn css_class(&self) -> &'static str {
        match self.kind {
            MilestoneKind::Upcoming => "milestone",
            MilestoneKind::Featured => "milestone milestone-featured",
            MilestoneKind::Future => "milestone milestone-future",
        }
    }
}

pub struct Faq {
    pub question: &'static str,
    pub answer: &'static str,
}

pub const ABOUT: &[&str] = &[
    "The title represents the rise of innovation in agriculture, the empowerment of farmers, and the growth of sustainable solutions for society.",
    "With an expected participation of 150+ teams and 150+ unique ideas, it is aimed at empowering innovators, students, and future entrepreneurs to solve real-world agricultural challenges through technology.",
    "The top 7 solutions will be incubated in our incubation cell, with the mentorship and resources to create a tangible impact.",
];

pub const HIGHLIGHTS: &[Highlight] = &[
    Highlight {
        value: "150+",
        label: "Teams Expected",
    },
    Highlight {
        value: "7",
        label: "Incubation Spots",
    },
    Highlight {
        value: "48",
        label: "Hours to Innovate",
    },
];

pub const THEMES: &[Theme] = &[
    Theme {
        title: "Smart Farming",
        description: "IoT solutions for precision agriculture and automated farming systems.",
    },
    Theme {
        title: "Sustainable Agriculture",
        description: "Eco-friendly practices and technologies for sustainable farming.",
    },
    Theme {
        title: "Supply Chain",
        description: "Blockchain and AI solutions for transparent and efficient supply chains.",
    },
    Theme {
        title: "Crop Monitoring",
        description: "Drone and satellite technologies for real-time crop health monitoring.",
    },
    Theme {
        title: "Market Access",
        description: "Digital platforms connecting farmers directly with consumers and markets.",
    },
    Theme {
        title: "Climate Resilience",
        description: "Solutions to help farmers adapt to climate change challenges.",
    },
];

pub const TIMELINE: &[Milestone] = &[
    Milestone {
        date: "December 15, 2024",
        time: "9:00 AM",
        title: "Registration Opens",
        description: "Team registration and idea submission begins. Form your teams and get ready to innovate!",
        kind: MilestoneKind::Upcoming,
    },
    Milestone {
        date: "January 10, 2025",
        time: "11:59 PM",
        title: "Registration Deadline",
        description: "Last date for team registration and initial idea submission.",
        kind: MilestoneKind::Upcoming,
    },
    Milestone {
        date: "January 15, 2025",
        time: "6:00 PM",
        title: "Team Selection",
        description: "Selected teams will be announced. Confirmation emails sent to all participants.",
        kind: MilestoneKind::Upcoming,
    },
    Milestone {
        date: "February 1-2, 2025",
        time: "Day 1: 9:00 AM",
        title: "Hackathon Weekend",
        description: "48-hour intensive hackathon begins. Build, innovate, and create groundbreaking solutions!",
        kind: MilestoneKind::Featured,
    },
    Milestone {
        date: "February 2, 2025",
        time: "4:00 PM",
        title: "Final Presentations",
        description: "Teams present their solutions to expert judges. Winners announced and prizes awarded.",
        kind: MilestoneKind::Featured,
    },
    Milestone {
        date: "February 15, 2025",
        time: "Ongoing",
        title: "Incubation Program",
        description: "Top 7 solutions enter our incubation program with mentorship and resources.",
        kind: MilestoneKind::Future,
    },
];

pub const FAQS: &[Faq] = &[
    Faq {
        question: "What is the Ezhumi Hackathon about?",
        answer: "Ezhumi is a 48-hour agriculture-focused hackathon where participants develop innovative solutions for farming challenges using technology, AI, IoT, and sustainable practices.",
    },
    Faq {
        question: "Who can participate in the hackathon?",
        answer: "The hackathon is open to students, professionals, farmers, tech enthusiasts, and anyone passionate about agricultural innovation. Teams of up to four can be formed with members from diverse backgrounds.",
    },
    Faq {
        question: "What are the main themes for the hackathon?",
        answer: "Our main themes include Smart Farming, Supply Chain Management, Crop Monitoring, Market Access, and Climate Resilience solutions for modern agriculture.",
    },
    Faq {
        question: "What is the prize pool and how are winners selected?",
        answer: "We have a total prize pool of ₹1L+ with multiple categories. Winners are selected based on innovation, feasibility, impact on agriculture, and presentation quality by our expert jury panel.",
    },
    Faq {
        question: "Do I need to bring my own hardware or software?",
        answer: "We provide basic infrastructure, WiFi, and development environments. Participants are encouraged to bring their own laptops and any specialized hardware their projects need.",
    },
];
