/**
 * ShowReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::env;
use std::error::Error;
use std::str::FromStr;

use getopts::{Matches, Options};
use tracing::info;
use tracing_subscriber::EnvFilter;

use showreco::evaluation::{self, EvaluationConfig};
use showreco::io;
use showreco::neighborhood::{self, LikeSetCosine};
use showreco::normalize::{Normalizer, NormalizerConfig};
use showreco::recommend;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    UserBased,
    ItemBased,
    ContentBased,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "cf" => Ok(Mode::UserBased),
            "items" => Ok(Mode::ItemBased),
            "cbf" => Ok(Mode::ContentBased),
            _ => Err(format!("Unknown mode '{}', use cf, items or cbf.", mode)),
        }
    }
}

struct Settings {
    profiles_path: String,
    stopwords_path: Option<String>,
    catalog_path: Option<String>,
    report_path: Option<String>,
    preference_matrix_path: Option<String>,
    feature_matrix_path: Option<String>,
    mode: Mode,
    user: Option<String>,
    num_items: usize,
    evaluation: EvaluationConfig,
}

fn main() {

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inputfile", "Profile file name (required). The input consists of one JSON \
        object per user, with an 'id' and optional text fields such as 'tv', 'about', 'movies', \
        'music', 'books', 'interests', 'activities', 'gender' and 'locale'.", "PATH");
    opts.optopt("s", "stopwords", "Stopword file name (optional). A comma separated list of \
        lowercase terms.", "PATH");
    opts.optopt("c", "catalog", "Curated show catalog (required for mode cbf). One show per \
        line with title, genres and text separated by tabs.", "PATH");
    opts.optopt("m", "mode", "Recommender to evaluate: cf (user-based), items (item-based) or \
        cbf (content-based). Defaults to cf.", "MODE");
    opts.optopt("t", "trials", "Number of evaluation trials (optional, defaults to 10).", "NUMBER");
    opts.optopt("f", "test-fraction", "Fraction of eligible users drawn as test users per trial \
        (optional, defaults to 0.3).", "FRACTION");
    opts.optopt("k", "num-neighbors", "Number of neighbors to recommend from (optional, \
        defaults to 10).", "NUMBER");
    opts.optopt("", "seed", "Seed for sampling test users and held-out items (optional, \
        defaults to 0).", "NUMBER");
    opts.optopt("p", "threads", "Number of trials to run in parallel (optional, defaults to \
        the number of CPUs).", "NUMBER");
    opts.optopt("o", "outputfile", "Output file name (optional, output will be written to \
        stdout by default).", "PATH");
    opts.optopt("", "preference-matrix", "Write the binary user x show matrix to this file \
        (optional).", "PATH");
    opts.optopt("", "feature-matrix", "Write the user x term frequency matrix to this file \
        (optional, mode cbf only).", "PATH");
    opts.optopt("u", "user", "Instead of evaluating, recommend shows for this user with \
        user-based collaborative filtering.", "ID");
    opts.optopt("n", "num-items", "Number of shows to recommend with --user (optional, \
        defaults to 10).", "NUMBER");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let settings = match settings(&matches) {
        Ok(settings) => settings,
        Err(hint) => return print_usage_and_exit(&program, opts, Some(&hint)),
    };

    if let Err(error) = run(&settings) {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    let brief = format!("Usage: {} [options]", program);

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
        eprint!("{}", opts.usage(&brief));
        std::process::exit(1);
    }

    eprint!("{}", opts.usage(&brief));
}

fn option<T: FromStr>(matches: &Matches, name: &str, default: T) -> Result<T, String>
    where T::Err: ToString {

    matches.opt_get_default(name, default)
        .map_err(|failure| format!("Problem with option '{}': {}", name, failure.to_string()))
}

fn settings(matches: &Matches) -> Result<Settings, String> {

    let profiles_path = matches.opt_str("i")
        .ok_or_else(|| String::from("Please specify an inputfile via --inputfile."))?;

    let mode = option(matches, "m", Mode::UserBased)?;
    let catalog_path = matches.opt_str("c");

    if mode == Mode::ContentBased && catalog_path.is_none() {
        return Err(String::from("Mode cbf needs a curated catalog via --catalog."));
    }

    let defaults = EvaluationConfig::default();
    let evaluation = EvaluationConfig {
        trials: option(matches, "t", defaults.trials)?,
        test_fraction: option(matches, "f", defaults.test_fraction)?,
        num_neighbors: option(matches, "k", defaults.num_neighbors)?,
        seed: option(matches, "seed", defaults.seed)?,
        num_threads: option(matches, "p", defaults.num_threads)?,
        ..defaults
    };

    Ok(Settings {
        profiles_path,
        stopwords_path: matches.opt_str("s"),
        catalog_path,
        report_path: matches.opt_str("o"),
        preference_matrix_path: matches.opt_str("preference-matrix"),
        feature_matrix_path: matches.opt_str("feature-matrix"),
        mode,
        user: matches.opt_str("u"),
        num_items: option(matches, "n", 10)?,
        evaluation,
    })
}

fn run(settings: &Settings) -> Result<(), Box<dyn Error>> {

    let stopwords = match settings.stopwords_path {
        Some(ref path) => io::read_stopwords(path)?,
        None => Default::default(),
    };

    let normalizer = Normalizer::new(NormalizerConfig { stopwords, ..Default::default() })?;

    info!("Reading profiles from {}", settings.profiles_path);
    let records = io::read_records(&settings.profiles_path)?;

    let (preferences, normalized) = showreco::preferences(&records, &normalizer);

    if let Some(ref path) = settings.preference_matrix_path {
        info!("Writing preference matrix to {}", path);
        io::write_matrix_to_file(&preferences.binary_matrix(), path)?;
    }

    if let Some(ref user) = settings.user {
        let user_index = preferences.user_index(user)
            .ok_or_else(|| format!("Unknown user '{}'", user))?;

        let candidates: Vec<u32> = (0..preferences.num_users() as u32).collect();
        let similarity = LikeSetCosine { likes: preferences.likes() };
        let neighbors = neighborhood::nearest_neighbors(
            &similarity, user_index, &candidates, settings.evaluation.num_neighbors);

        let items = recommend::top_items(
            preferences.likes(), preferences.likes_of(user_index), &neighbors, settings.num_items);

        let item_names: Vec<&str> = items.iter()
            .map(|item| preferences.items().name(*item))
            .collect();

        io::write_recommendations(user, &item_names, settings.report_path.as_deref())?;
        return Ok(());
    }

    let report = match settings.mode {
        Mode::UserBased => {
            evaluation::evaluate_collaborative(preferences.likes(), &settings.evaluation)?
        },
        Mode::ItemBased => {
            evaluation::evaluate_collaborative(&preferences.liked_by(), &settings.evaluation)?
        },
        Mode::ContentBased => {
            let catalog_path = settings.catalog_path.as_ref()
                .ok_or("Mode cbf needs a curated catalog")?;

            info!("Reading curated catalog from {}", catalog_path);
            let catalog = io::read_catalog(catalog_path, &normalizer)?;

            let model = showreco::content::ContentModel::build(
                &normalized, &preferences, &catalog, &normalizer);

            if let Some(ref path) = settings.feature_matrix_path {
                info!("Writing feature matrix to {}", path);
                io::write_matrix_to_file(model.features().rows(), path)?;
            }

            evaluation::evaluate_content_based(&model, &settings.evaluation)?
        },
    };

    io::write_report(&report, settings.report_path.as_deref())?;

    Ok(())
}
