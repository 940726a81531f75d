//! Writes `sample_theses.csv`, a synthetic snapshot that can be opened with
//! File → Open or pointed at via `csv_path` in the config.

use anyhow::{Context, Result};
use maritime_thesis_search::data::model::Column;

const SCHOOLS: [(&str, &[&str]); 3] = [
    (
        "國立臺灣海洋大學",
        &["航運管理學系", "商船學系", "輪機工程學系", "海洋法律研究所"],
    ),
    ("國立高雄科技大學", &["航運技術系", "供應鏈管理系", "海事資訊科技系"]),
    ("長榮大學", &["航運管理學系", "國際企業學系"]),
];
const DEGREES: [&str; 2] = ["碩士", "博士"];
const SURNAMES: [&str; 8] = ["陳", "林", "黃", "張", "李", "王", "吳", "劉"];
const GIVEN: [&str; 8] = ["志明", "淑芬", "冠宇", "怡君", "家豪", "雅婷", "俊傑", "佳穎"];
const TOPICS: [&str; 8] = [
    "貨櫃航商",
    "港埠作業",
    "船舶能源效率",
    "海事安全管理",
    "散裝航運市場",
    "船員職涯",
    "港口物流",
    "航運碳排放",
];
const ANGLES: [&str; 6] = [
    "之績效評估",
    "之影響因素分析",
    "之風險管理研究",
    "之服務品質探討",
    "之策略規劃",
    "之實證研究",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a, T: ?Sized>(&mut self, items: &[&'a T]) -> &'a T {
        items[self.below(items.len())]
    }

    fn person(&mut self) -> String {
        format!("{}{}", self.pick(&SURNAMES), self.pick(&GIVEN))
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = "sample_theses.csv";

    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record(Column::ALL.iter().map(|c| c.header()))?;

    let mut rows = 0usize;
    for i in 0..120 {
        // A few blank and half-filled lines, like a hand-maintained sheet.
        if i % 37 == 36 {
            writer.write_record(Column::ALL.iter().map(|_| ""))?;
            continue;
        }

        let (school, departments) = SCHOOLS[rng.below(SCHOOLS.len())];
        let department = rng.pick(departments);
        let degree = if rng.below(10) == 0 { DEGREES[1] } else { DEGREES[0] };
        let grad_year = 95 + rng.below(19);
        let pub_year = if i % 29 == 28 {
            "未公開".to_owned()
        } else {
            (2006 + rng.below(19)).to_string()
        };
        let title = format!("{}{}", rng.pick(&TOPICS), rng.pick(&ANGLES));

        writer.write_record([
            title,
            rng.person(),
            rng.person(),
            school.to_owned(),
            department.to_owned(),
            degree.to_owned(),
            grad_year.to_string(),
            pub_year,
        ])?;
        rows += 1;
    }
    writer.flush()?;

    println!("Wrote {rows} thesis records to {output_path}");
    Ok(())
}
