use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Known filename conventions, most specific first within each source.
/// Order decides the winner when several rules match the same name.
const RULES: &[(&str, &str)] = &[
    // IMG_120624372003024.jpg
    (r"IMG_[0-9]{14,16}\.[a-z0-9]{2,4}", "Camera"),
    // VID_20170628_230305.mp4, VID_20170628_230305~1.mp4, PANO_20150719_160215.jpg,
    // IMG_20170630_140333_01.jpg, IMG_20170630_140333~01.jpg, IMG_20170630_140333 01.jpg
    (r"(VID|PANO|IMG)_[0-9]{8}_[0-9]{6}((_|~|\s)[0-9]{1,3})?\.[a-z0-9]{2,4}", "Camera"),
    // 20170628_145804000_iOS.MOV
    (r"[0-9]{8}_[0-9]{9}_iOS\.[a-z0-9]{2,4}", "Camera"),
    // 2013-09-23 21.17.47.jpg, 2013-09-27 11.57.08-1.jpg
    (r"[0-9]{4}-[0-9]{2}-[0-9]{2}\s[0-9]{2}.[0-9]{2}.[0-9]{2}(-[0-9]{1,2})?\.[a-z0-9]{2,4}", "Camera"),
    // IMAG0089.jpg, VIDEO0010.mp4, DSCN3376.JPG
    (r"(IMAG|VIDEO|DSCN)[0-9]{4}\.[a-z0-9]{2,4}", "Camera"),
    // 168A3663.jpg
    (r"168A[0-9]{4}\.[a-z0-9]{2,3}", "Camera"),
    // received_10213452414052570.jpg, received_10204931109916782 1.jpeg,
    // received_10154410865625878~2.png
    (r"received_(-)?[0-9]{9,17}((\s|~)[0-9]{1,2})?\.[a-z0-9]{2,4}", "Messenger"),
    // 1497981783009.jpg
    (r"[0-9]{13}\.[a-z0-9]{2,4}", "Messenger"),
    // FB_IMG_1497608469236.jpg
    (r"FB_IMG_[0-9]{13}\.[a-z0-9]{2,4}", "Facebook"),
    // IMG-20170628-WA0003.jpeg
    (r"IMG-[0-9]{8}-WA[0-9]{4}\.[a-z0-9]{2,4}", "Whatsapp"),
    // jeaa024_1497370194791.jpg
    (r"[a-z0-9\.]*_[0-9]{13}\.[a-z0-9]{2,4}", "Snapchat"),
    // Snapchat-2150957531342551500.jpg
    (r"Snapchat-[0-9]{9,19}\.[a-z0-9]{2,4}", "Snapchat"),
    // sterling-ryan_2014-04-30_17-17-48.jpg
    (r"[a-z0-9\-\.]+_[0-9]{4}(-[0-9]{2}){2}_[0-9]{2}-[0-9]{2}-[0-9]{2}\.[a-z0-9]{2,3}", "Snapchat"),
    // 19050991_1249312888524710_4594791386611449856_n.jpg
    (r".*[0-9]{3,8}_[0-9]{13,17}_[0-9]{8,19}_(n|o)\.[a-z0-9]{2,4}", "Instagram"),
    // Screenshot_20170614-035751.jpg, Screenshot_20160727-193905~2.png
    (r"Screenshot_[0-9]{8}-[0-9]{6}(~[0-9]{1,2})?\.[a-z0-9]{2,4}", "Screenshots"),
    // 2017_03_23_22_41_14.mp4
    (r"[0-9]{4}(_[0-9]{2}){5}\.[a-z0-9]{2,4}", "Screenshots"),
    // Screenshot 2013-11-12 21.09.30.png
    (r"Screenshot\s[0-9]{4}(-[0-9]{2}){2}\s[0-9]{2}\.[0-9]{2}\.[0-9]{2}\.[a-z0-9]{2,3}", "Screenshots"),
    // Screenshot_2015-08-27-19-14-18.png, Screenshot_2015-05-10-12-56-15~2.jpg
    (r"Screenshot_[0-9]{4}(-[0-9]{2}){5}(~[0-9]{1,2})?\.[a-z0-9]{2,4}", "Screenshots"),
    // Snapshot_20111231_217.JPG
    (r"Snapshot_[0-9]{8}(_[0-9]{1,3})?\.[a-z0-9]{2,3}", "Webcam"),
    // WIN_20141231_234248.MP4
    (r"WIN_[0-9]{8}_[0-9]{6}\.[a-z0-9]{2,3}", "Webcam"),
    // 08 05 2017 9 32 pm Office Lens.jpg
    (r"([0-9]{1,4}\s){5}(am|pm)\sOffice\sLens(\s[0-9]{1,3})?\.[a-z0-9]{2,4}", "OfficeLens"),
    // Office Lens 20161127-235737.jpg
    (r"Office\sLens\s[0-9]{8}-[0-9]{6,8}\.[a-z0-9]{2,4}", "OfficeLens"),
];

/// A filename convention and the source it identifies.
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    tag: &'static str,
}

impl PatternRule {
    /// Compile a rule. The pattern always has to match the whole filename,
    /// ignoring case.
    pub fn new(pattern: &str, tag: &'static str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(true)
            .build()?;
        Ok(Self { regex, tag })
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, filename: &str) -> bool {
        self.regex.is_match(filename)
    }
}

static CATALOG: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|(pattern, tag)| PatternRule::new(pattern, tag).unwrap())
        .collect()
});

/// The built-in rule table, in evaluation order.
pub fn catalog() -> &'static [PatternRule] {
    &CATALOG
}
