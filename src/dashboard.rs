//! Static dashboard layouts: which charts appear, in which order, over which
//! columns, with which caption.

use std::borrow::Cow;

use crate::data::schema::{ColumnKind, Schema, SchemaError};

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    /// Distribution of a numeric column, stacked by `color_by` when given.
    /// `marginal_box` adds a horizontal box per group above the bars.
    Histogram {
        column: &'static str,
        bins: usize,
        color_by: Option<&'static str>,
        marginal_box: bool,
    },
    /// Share of each category.
    Pie { column: &'static str },
    /// Count per category, most frequent first.
    CountBar { column: &'static str },
    /// Numeric `value` per `category`, one box per `color_by` group.
    BoxPlot {
        category: &'static str,
        value: &'static str,
        color_by: Option<&'static str>,
    },
    /// Density of numeric `value` per `category`, with an inner box.
    Violin {
        category: &'static str,
        value: &'static str,
    },
    /// Numeric column picked by the user against `y`, OLS trendline per group.
    Scatter {
        y: &'static str,
        color_by: Option<&'static str>,
    },
    /// Pearson correlation of all numeric columns.
    Heatmap,
    /// Count per category of the user-selected categorical column.
    CountPlot,
    /// Word cloud of a fixed column, or of the selected categorical column.
    WordCloud { column: Option<&'static str> },
}

impl Chart {
    /// Columns the chart reads, with the kind each must have.
    pub fn requirements(&self) -> Vec<(&'static str, ColumnKind)> {
        use ColumnKind::*;
        let mut req = Vec::new();
        match *self {
            Chart::Histogram { column, color_by, .. } => {
                req.push((column, Numeric));
                req.extend(color_by.map(|c| (c, Categorical)));
            }
            Chart::Pie { column } | Chart::CountBar { column } => req.push((column, Categorical)),
            Chart::BoxPlot { category, value, color_by } => {
                req.push((category, Categorical));
                req.push((value, Numeric));
                req.extend(color_by.map(|c| (c, Categorical)));
            }
            Chart::Violin { category, value } => {
                req.push((category, Categorical));
                req.push((value, Numeric));
            }
            Chart::Scatter { y, color_by } => {
                req.push((y, Numeric));
                req.extend(color_by.map(|c| (c, Categorical)));
            }
            Chart::WordCloud { column: Some(column) } => req.push((column, Text)),
            Chart::Heatmap | Chart::CountPlot | Chart::WordCloud { column: None } => {}
        }
        req
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub chart: Chart,
    /// Caption; `{column}` is replaced with the user-selected column.
    pub insight: &'static str,
}

impl Section {
    pub fn insight_for(&self, selected: Option<&str>) -> Cow<'static, str> {
        match selected {
            Some(col) if self.insight.contains("{column}") => {
                Cow::Owned(self.insight.replace("{column}", col))
            }
            _ => Cow::Borrowed(self.insight),
        }
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Variant {
    /// Score-based results (`Students.csv`).
    #[default]
    Scores,
    /// AI-tool usage survey with sidebar filters.
    AiUsage,
}

impl Variant {
    /// Guess the variant from a file's column names.
    pub fn detect<S: AsRef<str>>(columns: &[S]) -> Self {
        if columns.iter().any(|c| c.as_ref() == "Stream") {
            Variant::AiUsage
        } else {
            Variant::Scores
        }
    }

    pub fn schema(self) -> Schema {
        match self {
            Variant::Scores => Schema::scores(),
            Variant::AiUsage => Schema::ai_usage(),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Variant::Scores => "🎓 Student Results Dashboard - Interaktif & Eksploratif",
            Variant::AiUsage => "🤖 Dashboard Penggunaan AI oleh Mahasiswa",
        }
    }

    /// Column whose mean is shown in the metrics row, with its label.
    pub fn headline(self) -> (&'static str, &'static str) {
        match self {
            Variant::Scores => ("Skor Rata-rata", "score"),
            Variant::AiUsage => ("Rata-rata Jam Penggunaan", "Daily_Usage_Hours"),
        }
    }

    pub fn count_label(self) -> &'static str {
        match self {
            Variant::Scores => "Jumlah Siswa",
            Variant::AiUsage => "Jumlah Mahasiswa",
        }
    }

    /// Columns offered as sidebar multi-select filters.
    pub fn filter_columns(self) -> &'static [&'static str] {
        match self {
            Variant::Scores => &[],
            Variant::AiUsage => &["Stream", "Year_of_Study", "Preferred_AI_Tool"],
        }
    }

    pub fn sections(self) -> &'static [Section] {
        match self {
            Variant::Scores => SCORES,
            Variant::AiUsage => AI_USAGE,
        }
    }

    pub fn conclusions(self) -> &'static [&'static str] {
        match self {
            Variant::Scores => &[
                "Kursus persiapan memiliki pengaruh signifikan terhadap skor siswa.",
                "Perempuan secara umum menunjukkan distribusi skor yang lebih baik.",
                "Pendidikan orang tua juga berkorelasi dengan skor siswa.",
                "Distribusi gender dan latar belakang cukup seimbang, memungkinkan analisis adil.",
                "Korelasi antar variabel numerik cukup rendah, menandakan skor dipengaruhi oleh kategori/psikologis/eksternal.",
            ],
            Variant::AiUsage => &[
                "ChatGPT mendominasi sebagai alat AI pilihan mahasiswa di semua jurusan.",
                "Rata-rata penggunaan harian berada di kisaran 1–4 jam.",
                "Kepercayaan terhadap AI tidak selalu sejalan dengan dampak pada nilai.",
                "Izin dari dosen memengaruhi persepsi dampak AI terhadap nilai.",
                "Sebagian besar mahasiswa mengakses AI melalui ponsel dengan internet yang memadai.",
            ],
        }
    }

    pub fn footer(self) -> &'static str {
        match self {
            Variant::Scores => {
                "Dashboard terinspirasi dari Kaggle EDA by Joshua Swords. Dibuat oleh NMAA x ChatGPT"
            }
            Variant::AiUsage => "Data: survei penggunaan alat AI oleh mahasiswa.",
        }
    }

    /// Check every section's columns against `schema`.
    pub fn check(self, schema: &Schema) -> Result<(), SchemaError> {
        for section in self.sections() {
            for (column, kind) in section.chart.requirements() {
                schema.expect_kind(column, kind)?;
            }
        }
        for column in self.filter_columns() {
            if !schema.contains(column) {
                return Err(SchemaError::MissingColumn(column.to_string()));
            }
        }
        let (_, headline) = self.headline();
        schema.expect_kind(headline, ColumnKind::Numeric)
    }
}

const SCORES: &[Section] = &[
    Section {
        title: "📊 Visual 1: Distribusi Nilai",
        chart: Chart::Histogram {
            column: "score",
            bins: 20,
            color_by: Some("gender"),
            marginal_box: true,
        },
        insight: "Insight: Sebagian besar siswa memiliki nilai antara 60 dan 80. Distribusi agak skew ke kiri.",
    },
    Section {
        title: "👥 Visual 2: Distribusi Gender (Pie Chart)",
        chart: Chart::Pie { column: "gender" },
        insight: "Insight: Data relatif seimbang antara siswa laki-laki dan perempuan.",
    },
    Section {
        title: "🎓 Visual 3: Level Pendidikan Orang Tua",
        chart: Chart::CountBar {
            column: "parental level of education",
        },
        insight: "Insight: Sebagian besar orang tua siswa memiliki pendidikan associate's degree atau high school.",
    },
    Section {
        title: "📘 Visual 4: Kursus Persiapan vs Skor (Boxplot)",
        chart: Chart::BoxPlot {
            category: "test preparation course",
            value: "score",
            color_by: None,
        },
        insight: "Insight: Siswa yang menyelesaikan kursus persiapan cenderung memiliki skor lebih tinggi.",
    },
    Section {
        title: "🎻 Visual 5: Gender vs Score (Violin)",
        chart: Chart::Violin {
            category: "gender",
            value: "score",
        },
        insight: "Insight: Distribusi skor perempuan lebih terkonsentrasi di skor tinggi dibanding laki-laki.",
    },
    Section {
        title: "📍 Visual 6: Scatter & Korelasi",
        chart: Chart::Scatter {
            y: "score",
            color_by: Some("gender"),
        },
        insight: "Insight: Terdapat hubungan antara {column} dan skor, terlihat dari trendline.",
    },
    Section {
        title: "🔥 Visual 7: Korelasi Numerik",
        chart: Chart::Heatmap,
        insight: "Insight: Korelasi tertinggi terjadi antara skor dan variabel terkait ujian atau pendidikan.",
    },
    Section {
        title: "📦 Visual 8: Eksplorasi Kategori",
        chart: Chart::CountPlot,
        insight: "Insight: Distribusi {column} menunjukkan preferensi yang dapat memengaruhi hasil belajar.",
    },
    Section {
        title: "☁️ Visual 9: WordCloud",
        chart: Chart::WordCloud { column: None },
        insight: "Insight: WordCloud menggambarkan dominasi nilai dalam '{column}' yang sering muncul.",
    },
    Section {
        title: "🎯 Visual 10: Score berdasarkan Pendidikan Orang Tua",
        chart: Chart::BoxPlot {
            category: "parental level of education",
            value: "score",
            color_by: Some("gender"),
        },
        insight: "Insight: Siswa dengan orang tua berpendidikan tinggi cenderung mendapat skor lebih tinggi.",
    },
];

const AI_USAGE: &[Section] = &[
    Section {
        title: "⏱️ Visual 1: Distribusi Jam Penggunaan Harian",
        chart: Chart::Histogram {
            column: "Daily_Usage_Hours",
            bins: 20,
            color_by: None,
            marginal_box: false,
        },
        insight: "Insight: Mayoritas mahasiswa menggunakan alat AI antara 1 hingga 4 jam per hari.",
    },
    Section {
        title: "🧰 Visual 2: Alat AI Favorit (Pie Chart)",
        chart: Chart::Pie {
            column: "Preferred_AI_Tool",
        },
        insight: "Insight: ChatGPT menjadi alat AI yang paling banyak dipilih mahasiswa.",
    },
    Section {
        title: "📱 Visual 3: Perangkat yang Digunakan",
        chart: Chart::Pie {
            column: "Device_Used",
        },
        insight: "Insight: Ponsel dan laptop adalah perangkat utama untuk mengakses alat AI.",
    },
    Section {
        title: "🏫 Visual 4: Jumlah Mahasiswa per Jurusan",
        chart: Chart::CountBar { column: "Stream" },
        insight: "Insight: Responden tersebar di berbagai jurusan, dengan dominasi jurusan teknik dan sains.",
    },
    Section {
        title: "🤝 Visual 5: Kepercayaan terhadap AI per Jurusan (Boxplot)",
        chart: Chart::BoxPlot {
            category: "Stream",
            value: "Trust_in_AI_Tools",
            color_by: None,
        },
        insight: "Insight: Tingkat kepercayaan terhadap AI relatif serupa antar jurusan.",
    },
    Section {
        title: "🎻 Visual 6: Jam Penggunaan per Tahun Studi (Violin)",
        chart: Chart::Violin {
            category: "Year_of_Study",
            value: "Daily_Usage_Hours",
        },
        insight: "Insight: Mahasiswa tingkat akhir cenderung menggunakan AI lebih lama per hari.",
    },
    Section {
        title: "📚 Visual 7: Izin Dosen vs Dampak pada Nilai",
        chart: Chart::BoxPlot {
            category: "Do_Professors_Allow_Use",
            value: "Impact_on_Grades",
            color_by: None,
        },
        insight: "Insight: Mahasiswa yang diizinkan dosen melaporkan dampak positif yang lebih besar pada nilai.",
    },
    Section {
        title: "📍 Visual 8: Scatter & Korelasi",
        chart: Chart::Scatter {
            y: "Impact_on_Grades",
            color_by: Some("Willing_to_Pay_for_Access"),
        },
        insight: "Insight: Hubungan antara {column} dan dampak pada nilai terlihat dari trendline.",
    },
    Section {
        title: "🔥 Visual 9: Korelasi Numerik",
        chart: Chart::Heatmap,
        insight: "Insight: Jam penggunaan, kepercayaan, dan tingkat kesadaran AI saling berkorelasi lemah hingga sedang.",
    },
    Section {
        title: "📦 Visual 10: Eksplorasi Kategori",
        chart: Chart::CountPlot,
        insight: "Insight: Distribusi {column} menunjukkan pola adopsi AI di kalangan mahasiswa.",
    },
    Section {
        title: "☁️ Visual 11: WordCloud Kegunaan AI",
        chart: Chart::WordCloud {
            column: Some("Use_Cases"),
        },
        insight: "Insight: Kegunaan AI yang paling sering disebut tampak paling besar pada WordCloud.",
    },
    Section {
        title: "☁️ Visual 12: WordCloud Kategori",
        chart: Chart::WordCloud { column: None },
        insight: "Insight: WordCloud menggambarkan dominasi nilai dalam '{column}' yang sering muncul.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::ColumnDef;

    #[test]
    fn presets_satisfy_their_layouts() {
        for variant in [Variant::Scores, Variant::AiUsage] {
            variant.check(&variant.schema()).expect("preset schema covers layout");
        }
    }

    #[test]
    fn check_rejects_wrong_kind() {
        let schema = Schema::new(vec![
            ColumnDef::required("gender", ColumnKind::Categorical),
            ColumnDef::required("parental level of education", ColumnKind::Categorical),
            ColumnDef::required("test preparation course", ColumnKind::Categorical),
            ColumnDef::required("score", ColumnKind::Categorical),
        ]);
        assert!(matches!(
            Variant::Scores.check(&schema),
            Err(SchemaError::WrongKind { column, .. }) if column == "score"
        ));
    }

    #[test]
    fn score_histogram_carries_marginal_box() {
        assert!(matches!(
            SCORES[0].chart,
            Chart::Histogram { column: "score", color_by: Some("gender"), marginal_box: true, .. }
        ));
        assert!(matches!(AI_USAGE[0].chart, Chart::Histogram { marginal_box: false, .. }));
    }

    #[test]
    fn detects_variant_from_headers() {
        assert_eq!(Variant::detect(&["Stream", "Year_of_Study"]), Variant::AiUsage);
        assert_eq!(Variant::detect(&["gender", "score"]), Variant::Scores);
    }

    #[test]
    fn insight_substitutes_selected_column() {
        let section = SCORES[7];
        assert_eq!(
            section.insight_for(Some("lunch")),
            "Insight: Distribusi lunch menunjukkan preferensi yang dapat memengaruhi hasil belajar."
        );
        assert_eq!(SCORES[0].insight_for(Some("lunch")), SCORES[0].insight);
    }
}
