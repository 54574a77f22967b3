/*!

This is the long-form manual for `congreso_report` and `congreso-report`.

## Reports

The following reports are available, under the name given to the `--report`
option of the command line tool:

* `summary` winner and leading parties of up to three departments for a year
* `trend` votes per year for up to three departments
* `top-partidos` ranked party totals under a scope, with an optional excluded party
* `teridata-indicators`, `dane-indicators` indicator values of up to three departments, grouped by dimension
* `elections-summary`, `elections-by-corporation` winner of each election year
* `years`, `corporations`, `parties`, `departments`, `municipalities`, `teridata-years`, `dane-years` option lists
* `records` one page of raw vote rows
* `count` number of vote rows, cached

### Department codes

Codes are compared after normalization: leading zeros are ignored, so that
`05`, `5` and `005` designate the same department. A raw code that is equal
after trimming also matches. A multi-department report accepts at most three
codes, separated by commas; extra codes are ignored.

### `summary`

For a given year (and optionally election body), the party with the most votes
in each requested department, the share of the winner in its department, and
the five parties with the most votes over all the requested departments.

Equal vote totals are ordered by party name.

### `trend`

The sum of the votes for each election year present in the dataset, for each
requested department. Years without any vote for a department are reported as
`0`.

### `top-partidos`

The seven parties with the most votes in a scope (year, election body,
department, municipality). When a party is excluded, it is removed from the
ranking but its votes still count in the scope total, and its own total is
reported separately. When both a department and a municipality are given, the
total of the whole department is also reported.

### `teridata-indicators` and `dane-indicators`

Each indicator becomes one label. The value of a department for a label is
the average of all its measurements (optionally restricted to one year).
Labels are grouped by dimension; indicators without any dimension go in the
group `Otros`. The census feed has no dimension column, so all its variables
end up in `Otros`.

## Input formats

The command line tool reads a JSON configuration file listing the input files:

```text
{
  "outputSettings": { "reportName": "dashboard" },
  "voteSources": [ { "provider": "csv", "filePath": "votes.csv" } ],
  "teridataSources": [ { "provider": "xlsx", "filePath": "kpi.xlsx", "excelWorksheetName": "Hoja1" } ],
  "daneSources": [ { "provider": "json", "filePath": "dane.json" } ],
  "departmentSources": [ { "provider": "csv", "filePath": "departamentos.csv", "delimiter": ";" } ],
  "municipalitySources": [],
  "countCacheTtlSeconds": 3600
}
```

Paths are relative to the configuration file. The following providers are
supported:

* `csv` Comma Separated Values with a header row. The delimiter defaults to `,`.
* `xlsx` Excel spreadsheet, first row as header. The worksheet defaults to the first one.
* `json` an array of objects, keyed by column name.

### Columns

All the providers use the same column names.

| table          | required columns                                   | optional columns |
|----------------|----------------------------------------------------|------------------|
| votes          | `anio_eleccion`, `codigo_departamento`, `votos`    | `corporacion`, `circunscripcion`, `circ_rep`, `codigo_divipole`, `nombre_puesto`, `comuna`, `mesa`, `partido`, `nombre_candidato`, `origen`, `fecha_carga`, `id` |
| teridata       | `codigo_departamento`                              | `dimension`, `indicador`, `dato_numerico`, `dato_cualitativo`, `anio`, `mes` |
| dane           | `codigo_departamento`                              | `variable`, `anio`, `total` |
| departments    | `codigo_departamento`, `nombre`                    | |
| municipalities | `codigo_departamento`, `codigo_divipole`           | `des_municipio` |

Empty cells are treated as missing values. Numeric indicator values accept a
decimal comma (`87,5`).

*/
