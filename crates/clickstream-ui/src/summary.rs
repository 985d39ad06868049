//! Console rendering of finalized reports.
//!
//! Every message starts with the `"{label} | "` prefix of the dataset it was
//! computed on.

use clickstream_core::formatting::{format_elapsed, format_number, label_prefix};
use clickstream_data::reports::{DatasetListing, ReportOutput, SoldProducts};
use unicode_width::UnicodeWidthStr;

use crate::bar_chart::BarChart;

/// Render `output` as console text for the dataset `label`.
pub fn render_report(label: &str, output: &ReportOutput) -> String {
    let p = label_prefix(label);

    match output {
        ReportOutput::EventTypes(types) => {
            let quoted: Vec<String> = types.iter().map(|t| format!("'{}'", t)).collect();
            format!(
                "{}got the following options as an event_type: [{}]",
                p,
                quoted.join(", ")
            )
        }
        ReportOutput::FunnelRate(rate) => format!(
            "{p}Complete funnels: {} out of {}\n{p}Rate of complete funnels: {}%",
            rate.complete,
            rate.pairs,
            rate.rate_percent,
            p = p
        ),
        ReportOutput::RepeatedOperations(means) => {
            BarChart::new(format!("{}Number of events by type", p), "Number of events")
                .decimals(3)
                .bars(means.iter().map(|(stage, mean)| (stage.to_string(), *mean)))
                .render()
        }
        ReportOutput::ViewsBeforeCart(mean) => format!(
            "{}A user views a product before adding it to the cart in average {} times",
            p,
            format_number(*mean, 3)
        ),
        ReportOutput::CartToPurchase(conversion) => format!(
            "{}The probability that products added once to the cart are effectively bought {}%",
            p, conversion.probability_percent
        ),
        ReportOutput::CartToPurchaseTime(timing) => format!(
            "{}The average time an item stays in the cart before being purchased {}",
            p,
            format_elapsed(timing.mean_seconds)
        ),
        ReportOutput::ViewToActionTime(timing) => format!(
            "{}The average time between the first view time and a purchase/addition to cart {}",
            p,
            format_elapsed(timing.mean_seconds)
        ),
        ReportOutput::TrendingCategories(counts) => BarChart::new(
            format!("{}Number of sold products per category", p),
            "Number of purchases",
        )
        .bars(counts.iter().map(|(c, n)| (c.clone(), *n as f64)))
        .render(),
        ReportOutput::VisitedSubcategories { top_n, visits } => {
            let suffix = top_n
                .map(|n| format!(" | top #{} sub categories", n))
                .unwrap_or_default();
            BarChart::new(
                format!("{}Number of visits per sub category{}", p, suffix),
                "Number of visits",
            )
            .bars(visits.iter().map(|(c, n)| (c.clone(), *n as f64)))
            .render()
        }
        ReportOutput::Categories(names) => {
            let mut text = format!("{}Categories: ", p);
            for name in names {
                text.push('\n');
                text.push_str(name);
            }
            text
        }
        ReportOutput::SoldProducts(sold) => render_sold_products(&p, sold),
        ReportOutput::BrandPrices {
            top_n,
            prices,
            category,
        } => {
            let suffix = top_n
                .map(|n| format!(" | top #{} brands", n))
                .unwrap_or_default();
            BarChart::new(
                format!(
                    "{}The average price of the products sold by the brand in '{}'{}",
                    p, category, suffix
                ),
                "Average price",
            )
            .decimals(2)
            .bars(prices.iter().map(|(b, v)| (b.clone(), *v)))
            .render()
        }
        ReportOutput::TopBrand { category, brands } => {
            let names = if brands.is_empty() {
                vec!["none".to_string()]
            } else {
                brands.clone()
            };
            let noun = if names.len() > 1 { "brands" } else { "brand" };
            format!(
                "{}For category '{}' the {} '{}' got the highest prices on average",
                p,
                category,
                noun,
                names.join("', '")
            )
        }
        ReportOutput::Datasets(listing) => render_datasets(listing),
    }
}

fn render_sold_products(prefix: &str, sold: &SoldProducts) -> String {
    let found = sold.product_ids.len();
    let shortfall = if found > 0 && found < sold.top_n {
        format!("{}/", found)
    } else {
        String::new()
    };
    let ids = if sold.product_ids.is_empty() {
        "none".to_string()
    } else {
        sold.product_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "{}The {}{} most sold products per '{}' are: {}",
        prefix, shortfall, sold.top_n, sold.category, ids
    )
}

/// One aligned row per dataset: label, known rows, known size, path.
fn render_datasets(listing: &[DatasetListing]) -> String {
    if listing.is_empty() {
        return "No datasets found".to_string();
    }

    let rows: Vec<[String; 4]> = listing
        .iter()
        .map(|d| {
            let info = d.info.unwrap_or_default();
            [
                d.label.clone(),
                info.total_n_rows
                    .map(|n| format_number(n as f64, 0))
                    .unwrap_or_else(|| "-".to_string()),
                info.total_size_mb
                    .map(|mb| format!("{} MB", format_number(mb, 0)))
                    .unwrap_or_else(|| "-".to_string()),
                d.path.display().to_string(),
            ]
        })
        .collect();

    let header = [
        "Label".to_string(),
        "Rows".to_string(),
        "Size".to_string(),
        "Path".to_string(),
    ];
    let mut widths = [0usize; 4];
    for row in std::iter::once(&header).chain(rows.iter()) {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.width());
        }
    }

    std::iter::once(&header)
        .chain(rows.iter())
        .map(|row| {
            row.iter()
                .zip(widths.iter())
                .map(|(cell, w)| format!("{}{}", cell, " ".repeat(w - cell.width())))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clickstream_core::datasets::DatasetInfo;
    use clickstream_core::models::EventType;
    use clickstream_data::reports::{CartConversion, FunnelRate, TimingSummary};
    use std::path::PathBuf;

    // ── funnel messages ───────────────────────────────────────────────────────

    #[test]
    fn test_render_event_types() {
        let output = ReportOutput::EventTypes(vec![EventType::Cart, EventType::View]);
        assert_eq!(
            render_report("2019-Oct", &output),
            "2019-Oct | got the following options as an event_type: ['cart', 'view']"
        );
    }

    #[test]
    fn test_render_funnel_rate() {
        let output = ReportOutput::FunnelRate(FunnelRate {
            complete: 3,
            pairs: 10,
            rate_percent: 30,
        });
        assert_eq!(
            render_report("2019-Oct", &output),
            "2019-Oct | Complete funnels: 3 out of 10\n2019-Oct | Rate of complete funnels: 30%"
        );
    }

    #[test]
    fn test_render_views_before_cart_nan() {
        let text = render_report("x", &ReportOutput::ViewsBeforeCart(f64::NAN));
        assert!(text.ends_with("in average nan times"));
    }

    #[test]
    fn test_render_cart_to_purchase() {
        let output = ReportOutput::CartToPurchase(CartConversion {
            carts: 3,
            purchases: 1,
            probability_percent: 33,
        });
        assert!(render_report("x", &output).ends_with("effectively bought 33%"));
    }

    #[test]
    fn test_render_timing() {
        let output = ReportOutput::CartToPurchaseTime(TimingSummary {
            mean_seconds: 205.0,
            samples: 2,
        });
        assert!(render_report("2019-Nov", &output)
            .ends_with("before being purchased 0 days 00:03:25"));
    }

    #[test]
    fn test_render_repeated_operations_chart() {
        let output = ReportOutput::RepeatedOperations(vec![
            (EventType::View, 3.5),
            (EventType::Cart, 0.25),
        ]);
        let text = render_report("2019-Oct", &output);
        assert!(text.starts_with("2019-Oct | Number of events by type\n(Number of events)"));
        assert!(text.contains("3.500"));
        assert!(text.contains("0.250"));
    }

    // ── category messages ─────────────────────────────────────────────────────

    #[test]
    fn test_render_visited_subcategories_title() {
        let output = ReportOutput::VisitedSubcategories {
            top_n: Some(10),
            visits: vec![("electronics.smartphone".to_string(), 7)],
        };
        let text = render_report("2019-Oct", &output);
        assert!(text.starts_with(
            "2019-Oct | Number of visits per sub category | top #10 sub categories"
        ));
    }

    #[test]
    fn test_render_categories_one_per_line() {
        let output = ReportOutput::Categories(vec!["apparel".into(), "electronics".into()]);
        assert_eq!(
            render_report("2019-Oct", &output),
            "2019-Oct | Categories: \napparel\nelectronics"
        );
    }

    #[test]
    fn test_render_sold_products_shortfall() {
        let output = ReportOutput::SoldProducts(SoldProducts {
            category: "electronics".into(),
            top_n: 10,
            product_ids: vec![5, 7],
        });
        assert_eq!(
            render_report("2019-Oct", &output),
            "2019-Oct | The 2/10 most sold products per 'electronics' are: 5, 7"
        );
    }

    #[test]
    fn test_render_sold_products_none() {
        let output = ReportOutput::SoldProducts(SoldProducts {
            category: "toys".into(),
            top_n: 10,
            product_ids: vec![],
        });
        assert_eq!(
            render_report("", &output),
            "The 10 most sold products per 'toys' are: none"
        );
    }

    // ── brand messages ────────────────────────────────────────────────────────

    #[test]
    fn test_render_top_brand_single() {
        let output = ReportOutput::TopBrand {
            category: "electronics".into(),
            brands: vec!["apple".into()],
        };
        assert_eq!(
            render_report("2019-Oct", &output),
            "2019-Oct | For category 'electronics' the brand 'apple' got the highest prices on average"
        );
    }

    #[test]
    fn test_render_top_brand_many_and_none() {
        let many = ReportOutput::TopBrand {
            category: "c".into(),
            brands: vec!["a".into(), "b".into()],
        };
        assert!(render_report("", &many).contains("the brands 'a', 'b' got"));

        let none = ReportOutput::TopBrand {
            category: "c".into(),
            brands: vec![],
        };
        assert!(render_report("", &none).contains("the brand 'none' got"));
    }

    #[test]
    fn test_render_brand_prices_chart() {
        let output = ReportOutput::BrandPrices {
            category: "electronics".into(),
            top_n: Some(10),
            prices: vec![("apple".into(), 500.0), ("sony".into(), 300.0)],
        };
        let text = render_report("2019-Oct", &output);
        assert!(text.contains("in 'electronics' | top #10 brands"));
        assert!(text.contains("500.00"));
    }

    // ── datasets ──────────────────────────────────────────────────────────────

    #[test]
    fn test_render_datasets_aligned() {
        let output = ReportOutput::Datasets(vec![
            DatasetListing {
                label: "2019-Oct".into(),
                path: PathBuf::from("datasets/2019-Oct.csv"),
                info: Some(DatasetInfo {
                    total_n_rows: Some(42_448_764),
                    total_size_mb: Some(5_407.0),
                }),
            },
            DatasetListing {
                label: "tiny".into(),
                path: PathBuf::from("datasets/tiny.csv"),
                info: None,
            },
        ]);
        let text = render_report("", &output);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Label     Rows"));
        assert!(lines[1].contains("42,448,764  5,407 MB"));
        assert!(lines[2].starts_with("tiny      -"));
    }

    #[test]
    fn test_render_datasets_empty() {
        assert_eq!(render_report("", &ReportOutput::Datasets(vec![])), "No datasets found");
    }
}
