//! Constructors of the server function catalog.
//!
//! Each entry maps a snake case constructor to the server function name, the
//! listed arguments become the call arguments in order.

use crate::{Arg, BinaryOp, F};

macro_rules! functions {
    ($($(#[$meta:meta])* $method:ident = $name:literal ($($arg:ident),*);)*) => {
        impl F {
            $(
                $(#[$meta])*
                pub fn $method($($arg: impl Into<Arg>),*) -> F {
                    F::new($name, vec![$($arg.into()),*])
                }
            )*
        }
    };
}

macro_rules! variadic_functions {
    ($($(#[$meta:meta])* $method:ident = $name:literal;)*) => {
        impl F {
            $(
                $(#[$meta])*
                pub fn $method<T: Into<Arg>>(args: impl IntoIterator<Item = T>) -> F {
                    F::new($name, args.into_iter().map(Into::into).collect())
                }
            )*
        }
    };
}

macro_rules! operators {
    ($($method:ident = $op:ident;)*) => {
        impl F {
            $(
                pub fn $method(lhs: impl Into<Arg>, rhs: impl Into<Arg>) -> F {
                    F::binary(BinaryOp::$op, lhs, rhs)
                }
            )*
        }
    };
}

macro_rules! parametric_functions {
    ($($(#[$meta:meta])* $method:ident = $name:literal ($($param:ident),*)($($arg:ident),*);)*) => {
        impl F {
            $(
                $(#[$meta])*
                pub fn $method($($param: impl Into<Arg>,)* $($arg: impl Into<Arg>),*) -> F {
                    F::parametric($name, vec![$($param.into()),*], vec![$($arg.into()),*])
                }
            )*
        }
    };
}

operators! {
    equals = Equal;
    not_equals = NotEqual;
    less = Less;
    less_or_equals = LessEqual;
    greater = Greater;
    greater_or_equals = GreaterEqual;
    like = Like;
    not_like = NotLike;
    and = And;
    or = Or;
}

impl F {
    pub fn is_in(lhs: impl Into<Arg>, rhs: impl Into<Arg>) -> F {
        F::binary(BinaryOp::In, lhs, tuple_list(rhs.into()))
    }

    pub fn is_not_in(lhs: impl Into<Arg>, rhs: impl Into<Arg>) -> F {
        F::binary(BinaryOp::NotIn, lhs, tuple_list(rhs.into()))
    }

    /// `count()`, use `count_of` to count the non null values of an expression.
    pub fn count() -> F {
        F::new("count", Vec::new())
    }

    pub fn cast(expression: impl Into<Arg>, db_type: &str) -> F {
        F::new("CAST", vec![expression.into(), Arg::Str(db_type.into())])
    }

    /// `quantiles(0.5, 0.9)(x)`
    pub fn quantiles(levels: impl IntoIterator<Item = f64>, expression: impl Into<Arg>) -> F {
        F::parametric(
            "quantiles",
            levels.into_iter().map(Arg::Float).collect(),
            vec![expression.into()],
        )
    }

    pub fn quantiles_exact(
        levels: impl IntoIterator<Item = f64>,
        expression: impl Into<Arg>,
    ) -> F {
        F::parametric(
            "quantilesExact",
            levels.into_iter().map(Arg::Float).collect(),
            vec![expression.into()],
        )
    }
}

fn tuple_list(arg: Arg) -> Arg {
    match arg {
        Arg::Array(items) => Arg::Tuple(items),
        v => v,
    }
}

// Arithmetic
functions! {
    plus = "plus"(a, b);
    minus = "minus"(a, b);
    multiply = "multiply"(a, b);
    divide = "divide"(a, b);
    modulo = "modulo"(a, b);
    int_div_or_zero = "intDivOrZero"(a, b);
    negate = "negate"(a);
    abs = "abs"(a);
    gcd = "gcd"(a, b);
    lcm = "lcm"(a, b);
}

// Logical and conditional
functions! {
    xor = "xor"(a, b);
    not = "not"(a);
    if_ = "if"(cond, then, otherwise);
}
variadic_functions! {
    /// `multiIf(cond1, then1, cond2, then2, ..., else)`
    multi_if = "multiIf";
}

// Math
functions! {
    e = "e"();
    pi = "pi"();
    exp = "exp"(x);
    log = "log"(x);
    exp2 = "exp2"(x);
    log2 = "log2"(x);
    exp10 = "exp10"(x);
    log10 = "log10"(x);
    sqrt = "sqrt"(x);
    cbrt = "cbrt"(x);
    erf = "erf"(x);
    erfc = "erfc"(x);
    lgamma = "lgamma"(x);
    tgamma = "tgamma"(x);
    sin = "sin"(x);
    cos = "cos"(x);
    tan = "tan"(x);
    asin = "asin"(x);
    acos = "acos"(x);
    atan = "atan"(x);
    power = "power"(x, y);
}

// Rounding
functions! {
    floor = "floor"(x);
    floor_n = "floor"(x, n);
    ceiling = "ceiling"(x);
    ceiling_n = "ceiling"(x, n);
    round = "round"(x);
    round_n = "round"(x, n);
    round_bankers = "roundBankers"(x, n);
    round_down = "roundDown"(x, array);
    round_to_exp2 = "roundToExp2"(x);
    round_duration = "roundDuration"(x);
    round_age = "roundAge"(x);
}

// Dates and times
functions! {
    to_year = "toYear"(d);
    to_iso_year = "toISOYear"(d);
    to_quarter = "toQuarter"(d);
    to_month = "toMonth"(d);
    to_week = "toWeek"(d, mode);
    to_iso_week = "toISOWeek"(d);
    to_day_of_year = "toDayOfYear"(d);
    to_day_of_month = "toDayOfMonth"(d);
    to_day_of_week = "toDayOfWeek"(d);
    to_hour = "toHour"(d);
    to_minute = "toMinute"(d);
    to_second = "toSecond"(d);
    to_monday = "toMonday"(d);
    to_start_of_year = "toStartOfYear"(d);
    to_start_of_iso_year = "toStartOfISOYear"(d);
    to_start_of_quarter = "toStartOfQuarter"(d);
    to_start_of_month = "toStartOfMonth"(d);
    to_start_of_week = "toStartOfWeek"(d, mode);
    to_start_of_day = "toStartOfDay"(d);
    to_start_of_hour = "toStartOfHour"(d);
    to_start_of_minute = "toStartOfMinute"(d);
    to_start_of_five_minute = "toStartOfFiveMinute"(d);
    to_start_of_fifteen_minutes = "toStartOfFifteenMinutes"(d);
    to_start_of_ten_minutes = "toStartOfTenMinutes"(d);
    to_start_of_interval = "toStartOfInterval"(d, interval);
    to_time = "toTime"(d);
    to_timezone = "toTimeZone"(d, timezone);
    to_unix_timestamp = "toUnixTimestamp"(d);
    to_yyyymm = "toYYYYMM"(d);
    to_yyyymmdd = "toYYYYMMDD"(d);
    to_yyyymmddhhmmss = "toYYYYMMDDhhmmss"(d);
    to_relative_year_num = "toRelativeYearNum"(d);
    to_relative_month_num = "toRelativeMonthNum"(d);
    to_relative_week_num = "toRelativeWeekNum"(d);
    to_relative_day_num = "toRelativeDayNum"(d);
    to_relative_hour_num = "toRelativeHourNum"(d);
    to_relative_minute_num = "toRelativeMinuteNum"(d);
    to_relative_second_num = "toRelativeSecondNum"(d);
    now = "now"();
    today = "today"();
    yesterday = "yesterday"();
    time_slot = "timeSlot"(d);
    time_slots = "timeSlots"(start_time, duration);
    format_date_time = "formatDateTime"(d, format);
    date_diff = "dateDiff"(unit, start, end);
    add_years = "addYears"(d, n);
    add_quarters = "addQuarters"(d, n);
    add_months = "addMonths"(d, n);
    add_weeks = "addWeeks"(d, n);
    add_days = "addDays"(d, n);
    add_hours = "addHours"(d, n);
    add_minutes = "addMinutes"(d, n);
    add_seconds = "addSeconds"(d, n);
    subtract_years = "subtractYears"(d, n);
    subtract_quarters = "subtractQuarters"(d, n);
    subtract_months = "subtractMonths"(d, n);
    subtract_weeks = "subtractWeeks"(d, n);
    subtract_days = "subtractDays"(d, n);
    subtract_hours = "subtractHours"(d, n);
    subtract_minutes = "subtractMinutes"(d, n);
    subtract_seconds = "subtractSeconds"(d, n);
    to_interval_second = "toIntervalSecond"(n);
    to_interval_minute = "toIntervalMinute"(n);
    to_interval_hour = "toIntervalHour"(n);
    to_interval_day = "toIntervalDay"(n);
    to_interval_week = "toIntervalWeek"(n);
    to_interval_month = "toIntervalMonth"(n);
    to_interval_quarter = "toIntervalQuarter"(n);
    to_interval_year = "toIntervalYear"(n);
}

// Type conversion, combine with `or_zero` and `or_null` for the lenient variants
functions! {
    to_uint8 = "toUInt8"(x);
    to_uint16 = "toUInt16"(x);
    to_uint32 = "toUInt32"(x);
    to_uint64 = "toUInt64"(x);
    to_int8 = "toInt8"(x);
    to_int16 = "toInt16"(x);
    to_int32 = "toInt32"(x);
    to_int64 = "toInt64"(x);
    to_float32 = "toFloat32"(x);
    to_float64 = "toFloat64"(x);
    to_decimal32 = "toDecimal32"(x, scale);
    to_decimal64 = "toDecimal64"(x, scale);
    to_decimal128 = "toDecimal128"(x, scale);
    to_date = "toDate"(x);
    to_date_time = "toDateTime"(x);
    to_date_time_tz = "toDateTime"(x, timezone);
    to_date_time64 = "toDateTime64"(x, precision);
    to_string = "toString"(x);
    to_fixed_string = "toFixedString"(s, length);
    to_string_cut_to_zero = "toStringCutToZero"(s);
    to_uuid = "toUUID"(s);
    to_nullable = "toNullable"(x);
    reinterpret_as_uint8 = "reinterpretAsUInt8"(x);
    reinterpret_as_uint16 = "reinterpretAsUInt16"(x);
    reinterpret_as_uint32 = "reinterpretAsUInt32"(x);
    reinterpret_as_uint64 = "reinterpretAsUInt64"(x);
    reinterpret_as_int8 = "reinterpretAsInt8"(x);
    reinterpret_as_int16 = "reinterpretAsInt16"(x);
    reinterpret_as_int32 = "reinterpretAsInt32"(x);
    reinterpret_as_int64 = "reinterpretAsInt64"(x);
    reinterpret_as_float32 = "reinterpretAsFloat32"(x);
    reinterpret_as_float64 = "reinterpretAsFloat64"(x);
    reinterpret_as_date = "reinterpretAsDate"(x);
    reinterpret_as_date_time = "reinterpretAsDateTime"(x);
    reinterpret_as_string = "reinterpretAsString"(x);
    parse_date_time_best_effort = "parseDateTimeBestEffort"(s);
}

// Strings, combine with `utf8` for the code point variants
functions! {
    empty = "empty"(s);
    not_empty = "notEmpty"(s);
    length = "length"(s);
    lower = "lower"(s);
    upper = "upper"(s);
    reverse = "reverse"(s);
    substring = "substring"(s, offset, length);
    append_trailing_char_if_absent = "appendTrailingCharIfAbsent"(s, c);
    convert_charset = "convertCharset"(s, from, to);
    base64_encode = "base64Encode"(s);
    base64_decode = "base64Decode"(s);
    try_base64_decode = "tryBase64Decode"(s);
    starts_with = "startsWith"(s, prefix);
    ends_with = "endsWith"(s, suffix);
    trim_left = "trimLeft"(s);
    trim_right = "trimRight"(s);
    trim_both = "trimBoth"(s);
    crc32 = "CRC32"(s);
    left_pad = "leftPad"(s, length, pad);
    right_pad = "rightPad"(s, length, pad);
    position = "position"(haystack, needle);
    position_case_insensitive = "positionCaseInsensitive"(haystack, needle);
    match_ = "match"(haystack, pattern);
    extract = "extract"(haystack, pattern);
    extract_all = "extractAll"(haystack, pattern);
    ilike = "ilike"(haystack, pattern);
    replace_one = "replaceOne"(haystack, pattern, replacement);
    replace_all = "replaceAll"(haystack, pattern, replacement);
    replace_regexp_one = "replaceRegexpOne"(haystack, pattern, replacement);
    replace_regexp_all = "replaceRegexpAll"(haystack, pattern, replacement);
    regexp_quote_meta = "regexpQuoteMeta"(s);
    multi_search_any = "multiSearchAny"(haystack, needles);
    multi_search_first_index = "multiSearchFirstIndex"(haystack, needles);
    multi_match_any = "multiMatchAny"(haystack, patterns);
    split_by_char = "splitByChar"(separator, s);
    split_by_string = "splitByString"(separator, s);
    array_string_concat = "arrayStringConcat"(array, separator);
    alpha_tokens = "alphaTokens"(s);
}
variadic_functions! {
    concat = "concat";
    format = "format";
}

// Arrays
functions! {
    empty_array_string = "emptyArrayString"();
    array_element = "arrayElement"(array, n);
    has = "has"(array, x);
    has_all = "hasAll"(array, subset);
    has_any = "hasAny"(array, subset);
    index_of = "indexOf"(array, x);
    count_equal = "countEqual"(array, x);
    array_enumerate = "arrayEnumerate"(array);
    array_pop_back = "arrayPopBack"(array);
    array_pop_front = "arrayPopFront"(array);
    array_push_back = "arrayPushBack"(array, x);
    array_push_front = "arrayPushFront"(array, x);
    array_resize = "arrayResize"(array, size, extender);
    array_slice = "arraySlice"(array, offset, length);
    array_reverse = "arrayReverse"(array);
    array_distinct = "arrayDistinct"(array);
    array_join = "arrayJoin"(array);
    array_flatten = "arrayFlatten"(array);
    range = "range"(n);
}
variadic_functions! {
    array = "array";
    array_concat = "arrayConcat";
    array_enumerate_uniq = "arrayEnumerateUniq";
    array_uniq = "arrayUniq";
    array_intersect = "arrayIntersect";
}

// Bits and bitmaps
functions! {
    bit_and = "bitAnd"(a, b);
    bit_or = "bitOr"(a, b);
    bit_xor = "bitXor"(a, b);
    bit_not = "bitNot"(a);
    bit_shift_left = "bitShiftLeft"(a, b);
    bit_shift_right = "bitShiftRight"(a, b);
    bit_test = "bitTest"(a, index);
    bitmap_build = "bitmapBuild"(array);
    bitmap_to_array = "bitmapToArray"(bitmap);
    bitmap_contains = "bitmapContains"(bitmap, x);
    bitmap_has_any = "bitmapHasAny"(a, b);
    bitmap_has_all = "bitmapHasAll"(a, b);
    bitmap_and = "bitmapAnd"(a, b);
    bitmap_or = "bitmapOr"(a, b);
    bitmap_xor = "bitmapXor"(a, b);
    bitmap_andnot = "bitmapAndnot"(a, b);
    bitmap_cardinality = "bitmapCardinality"(bitmap);
}
variadic_functions! {
    bit_test_all = "bitTestAll";
    bit_test_any = "bitTestAny";
}

// Hashing, encoding and random numbers
functions! {
    half_md5 = "halfMD5"(s);
    md5 = "MD5"(s);
    sip_hash64 = "sipHash64"(s);
    sip_hash128 = "sipHash128"(s);
    int_hash32 = "intHash32"(x);
    int_hash64 = "intHash64"(x);
    sha1 = "SHA1"(s);
    sha224 = "SHA224"(s);
    sha256 = "SHA256"(s);
    url_hash = "URLHash"(url);
    murmur_hash2_32 = "murmurHash2_32"(x);
    murmur_hash2_64 = "murmurHash2_64"(x);
    murmur_hash3_32 = "murmurHash3_32"(x);
    murmur_hash3_64 = "murmurHash3_64"(x);
    murmur_hash3_128 = "murmurHash3_128"(s);
    xx_hash32 = "xxHash32"(x);
    xx_hash64 = "xxHash64"(x);
    hex = "hex"(x);
    unhex = "unhex"(s);
    bitmask_to_list = "bitmaskToList"(x);
    bitmask_to_array = "bitmaskToArray"(x);
    rand = "rand"();
    rand64 = "rand64"();
    rand_constant = "randConstant"();
}
variadic_functions! {
    city_hash64 = "cityHash64";
    farm_hash64 = "farmHash64";
    java_hash = "javaHash";
    hive_hash = "hiveHash";
}

// UUIDs and addresses
functions! {
    generate_uuid_v4 = "generateUUIDv4"();
    uuid_num_to_string = "UUIDNumToString"(s);
    uuid_string_to_num = "UUIDStringToNum"(s);
    ipv4_num_to_string = "IPv4NumToString"(x);
    ipv4_string_to_num = "IPv4StringToNum"(s);
    ipv4_num_to_string_class_c = "IPv4NumToStringClassC"(x);
    ipv4_to_ipv6 = "IPv4ToIPv6"(x);
    ipv6_num_to_string = "IPv6NumToString"(x);
    ipv6_string_to_num = "IPv6StringToNum"(s);
    to_ipv4 = "toIPv4"(s);
    to_ipv6 = "toIPv6"(s);
    ipv4_cidr_to_range = "IPv4CIDRToRange"(ipv4, cidr);
    ipv6_cidr_to_range = "IPv6CIDRToRange"(ipv6, cidr);
}

// URLs
functions! {
    protocol = "protocol"(url);
    domain = "domain"(url);
    domain_without_www = "domainWithoutWWW"(url);
    top_level_domain = "topLevelDomain"(url);
    first_significant_subdomain = "firstSignificantSubdomain"(url);
    cut_to_first_significant_subdomain = "cutToFirstSignificantSubdomain"(url);
    path = "path"(url);
    path_full = "pathFull"(url);
    query_string = "queryString"(url);
    fragment = "fragment"(url);
    query_string_and_fragment = "queryStringAndFragment"(url);
    extract_url_parameter = "extractURLParameter"(url, name);
    extract_url_parameters = "extractURLParameters"(url);
    extract_url_parameter_names = "extractURLParameterNames"(url);
    url_hierarchy = "URLHierarchy"(url);
    url_path_hierarchy = "URLPathHierarchy"(url);
    decode_url_component = "decodeURLComponent"(url);
    cut_www = "cutWWW"(url);
    cut_query_string = "cutQueryString"(url);
    cut_fragment = "cutFragment"(url);
    cut_query_string_and_fragment = "cutQueryStringAndFragment"(url);
    cut_url_parameter = "cutURLParameter"(url, name);
}

// Nulls and tuples
functions! {
    is_null = "isNull"(x);
    is_not_null = "isNotNull"(x);
    if_null = "ifNull"(x, alternative);
    null_if = "nullIf"(x, y);
    assume_not_null = "assumeNotNull"(x);
    tuple_element = "tupleElement"(tuple, n);
}
variadic_functions! {
    coalesce = "coalesce";
    tuple = "tuple";
    greatest = "greatest";
    least = "least";
}

// Aggregates, combine with `with_if`, `or_default` and `or_null`
functions! {
    count_of = "count"(x);
    any = "any"(x);
    any_heavy = "anyHeavy"(x);
    any_last = "anyLast"(x);
    arg_min = "argMin"(arg, value);
    arg_max = "argMax"(arg, value);
    avg = "avg"(x);
    corr = "corr"(x, y);
    covar_pop = "covarPop"(x, y);
    covar_samp = "covarSamp"(x, y);
    kurt_pop = "kurtPop"(x);
    kurt_samp = "kurtSamp"(x);
    min = "min"(x);
    max = "max"(x);
    skew_pop = "skewPop"(x);
    skew_samp = "skewSamp"(x);
    sum = "sum"(x);
    sum_with_overflow = "sumWithOverflow"(x);
    sum_map = "sumMap"(keys, values);
    var_pop = "varPop"(x);
    var_samp = "varSamp"(x);
    stddev_pop = "stddevPop"(x);
    stddev_samp = "stddevSamp"(x);
    group_array = "groupArray"(x);
    group_uniq_array = "groupUniqArray"(x);
    group_bit_and = "groupBitAnd"(x);
    group_bit_or = "groupBitOr"(x);
    group_bit_xor = "groupBitXor"(x);
    group_bitmap = "groupBitmap"(x);
    median = "median"(x);
    median_exact = "medianExact"(x);
    avg_weighted = "avgWeighted"(x, weight);
}
variadic_functions! {
    uniq = "uniq";
    uniq_exact = "uniqExact";
    uniq_hll12 = "uniqHLL12";
    uniq_combined = "uniqCombined";
}

// Parametric aggregates
parametric_functions! {
    quantile = "quantile"(level)(x);
    quantile_exact = "quantileExact"(level)(x);
    quantile_exact_weighted = "quantileExactWeighted"(level)(x, weight);
    quantile_timing = "quantileTiming"(level)(x);
    quantile_timing_weighted = "quantileTimingWeighted"(level)(x, weight);
    quantile_deterministic = "quantileDeterministic"(level)(x, determinator);
    quantile_t_digest = "quantileTDigest"(level)(x);
    top_k = "topK"(k)(x);
    group_array_n = "groupArray"(max_size)(x);
    group_uniq_array_n = "groupUniqArray"(max_size)(x);
    histogram = "histogram"(bins)(x);
}

#[cfg(test)]
mod tests {
    use crate::{Arg, Col, F, Operators};

    #[test]
    fn nested_calls() {
        let expr = F::to_start_of_month(F::to_date(Col::new("timestamp")));
        assert_eq!(expr.to_sql(), "toStartOfMonth(toDate(`timestamp`))");
    }

    #[test]
    fn operators_are_parenthesized() {
        let a = Col::new("a");
        let expr = F::and(a.greater(1), a.less_or_equals(10));
        assert_eq!(expr.to_sql(), "((`a` > 1) AND (`a` <= 10))");
    }

    #[test]
    fn arithmetic_operators() {
        let expr = (Col::new("price") * 2 + 1) / Col::new("qty");
        assert_eq!(expr.to_sql(), "(((`price` * 2) + 1) / `qty`)");
        assert_eq!((Col::new("n") % 7 - 1).to_sql(), "((`n` % 7) - 1)");
        assert_eq!(F::plus(Col::new("a"), 1).to_sql(), "plus(`a`, 1)");
        assert_eq!((-Col::new("x")).to_sql(), "negate(`x`)");
        assert_eq!(
            (Col::new("a").greater(1) & Col::new("b").less(2)).to_sql(),
            "((`a` > 1) AND (`b` < 2))"
        );
        assert_eq!((Col::new("a") ^ Col::new("b")).to_sql(), "xor(`a`, `b`)");
    }

    #[test]
    fn combinators() {
        let sum = F::sum(Col::new("amount"));
        assert_eq!(
            sum.with_if(Col::new("paid").equals(true)).to_sql(),
            "sumIf(`amount`, (`paid` = 1))"
        );
        assert_eq!(F::to_int32("12x").or_zero().to_sql(), "toInt32OrZero('12x')");
        assert_eq!(F::length("abc").utf8().to_sql(), "lengthUTF8('abc')");
        assert_eq!(F::avg(Col::new("x")).or_null().to_sql(), "avgOrNull(`x`)");
        assert_eq!(sum.to_sql(), "sum(`amount`)");
    }

    #[test]
    fn parametric() {
        assert_eq!(
            F::quantile(0.9, Col::new("latency")).to_sql(),
            "quantile(0.9)(`latency`)"
        );
        assert_eq!(
            F::quantiles([0.5, 0.99], Col::new("latency")).to_sql(),
            "quantiles(0.5, 0.99)(`latency`)"
        );
        assert_eq!(
            F::quantile(0.5, Col::new("x")).with_if(Col::new("ok")).to_sql(),
            "quantileIf(0.5)(`x`, `ok`)"
        );
    }

    #[test]
    fn literals() {
        assert_eq!(F::concat(["it's", "\n"]).to_sql(), "concat('it\\'s', '\\n')");
        assert_eq!(
            F::is_in(Col::new("n"), [1, 2, 3]).to_sql(),
            "(`n` IN (1, 2, 3))"
        );
        assert_eq!(
            F::to_date_time_tz(Col::new("t"), Arg::tz("Europe/Rome")).to_sql(),
            "toDateTime(`t`, 'Europe/Rome')"
        );
        assert_eq!(F::array(Vec::<i32>::new()).to_sql(), "array()");
        assert_eq!(F::if_null(Col::new("x"), Option::<i32>::None).to_sql(), "ifNull(`x`, NULL)");
        assert_eq!(
            F::add_days(time::macros::date!(2020 - 02 - 28), 1).to_sql(),
            "addDays(toDate('2020-02-28'), 1)"
        );
        assert_eq!(F::count().to_sql(), "count()");
    }
}
